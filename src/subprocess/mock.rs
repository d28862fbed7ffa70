use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::error::ProcessError;
use super::runner::{ExitStatus, ProcessCommand, ProcessOutput, ProcessRunner};

type ArgsFilter = Box<dyn Fn(&[String]) -> bool + Send + Sync>;

/// Canned result for a scripted program
#[derive(Debug, Clone)]
pub struct MockReply {
    status: ExitStatus,
    stdout: String,
    stderr: String,
    /// Fail as if the program were not installed
    missing: bool,
}

impl MockReply {
    pub fn ok() -> Self {
        Self {
            status: ExitStatus::Success,
            stdout: String::new(),
            stderr: String::new(),
            missing: false,
        }
    }

    /// Successful run printing `text`
    pub fn stdout(text: &str) -> Self {
        Self {
            stdout: text.to_string(),
            ..Self::ok()
        }
    }

    pub fn exit(code: i32) -> Self {
        Self {
            status: if code == 0 {
                ExitStatus::Success
            } else {
                ExitStatus::Error(code)
            },
            ..Self::ok()
        }
    }

    /// The runner reports the program as not found instead of replying
    pub fn not_found() -> Self {
        Self {
            missing: true,
            ..Self::ok()
        }
    }

    pub fn with_stderr(mut self, text: &str) -> Self {
        self.stderr = text.to_string();
        self
    }
}

struct Rule {
    program: String,
    filter: Option<ArgsFilter>,
    reply: MockReply,
    /// `None` replies forever
    remaining: Option<usize>,
}

impl Rule {
    fn matches(&self, command: &ProcessCommand) -> bool {
        self.program == command.program
            && self.remaining != Some(0)
            && self.filter.as_ref().map_or(true, |f| f(&command.args))
    }
}

/// Process runner that records every command and answers from a script.
///
/// Rules are consulted in the order they were added; the first rule whose
/// program and argument filter match supplies the reply. A command no rule
/// matches fails with [`ProcessError::Unscripted`].
#[derive(Clone, Default)]
pub struct MockProcessRunner {
    rules: Arc<Mutex<Vec<Rule>>>,
    calls: Arc<Mutex<Vec<ProcessCommand>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, program: &str, reply: MockReply) {
        self.add_rule(program, None, reply, None);
    }

    /// Reply only when the arguments satisfy `filter`
    pub fn respond_when<F>(&self, program: &str, filter: F, reply: MockReply)
    where
        F: Fn(&[String]) -> bool + Send + Sync + 'static,
    {
        self.add_rule(program, Some(Box::new(filter)), reply, None);
    }

    /// Reply to the next `times` matching calls, then stop matching
    pub fn respond_times(&self, program: &str, reply: MockReply, times: usize) {
        self.add_rule(program, None, reply, Some(times));
    }

    fn add_rule(
        &self,
        program: &str,
        filter: Option<ArgsFilter>,
        reply: MockReply,
        remaining: Option<usize>,
    ) {
        lock(&self.rules).push(Rule {
            program: program.to_string(),
            filter,
            reply,
            remaining,
        });
    }

    /// Every command run so far, in order
    pub fn calls(&self) -> Vec<ProcessCommand> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self, program: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|command| command.program == program)
            .count()
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        lock(&self.calls).push(command.clone());

        let reply = {
            let mut rules = lock(&self.rules);
            let Some(rule) = rules.iter_mut().find(|rule| rule.matches(&command)) else {
                return Err(ProcessError::Unscripted(command.display_line()));
            };
            if let Some(remaining) = rule.remaining.as_mut() {
                *remaining -= 1;
            }
            rule.reply.clone()
        };

        if reply.missing {
            return Err(ProcessError::CommandNotFound(command.program));
        }
        Ok(ProcessOutput {
            status: reply.status,
            stdout: reply.stdout,
            stderr: reply.stderr,
            duration: Duration::ZERO,
        })
    }
}
