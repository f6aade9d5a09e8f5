//! Scripted tool runner for tests and dry runs.

use super::invocation::{Invocation, ToolOutput};
use super::runner::ToolRunner;
use crate::error::Result;
use std::{collections::HashSet, path::PathBuf, sync::Mutex};

type Handler = Box<dyn Fn(&Invocation) -> Result<ToolOutput> + Send + Sync>;

/// Records every invocation and answers with a scripted handler.
pub struct ScriptedRunner {
    handler: Handler,
    missing: HashSet<String>,
    log: Mutex<Vec<Invocation>>,
}

impl std::fmt::Debug for ScriptedRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedRunner")
            .field("missing", &self.missing)
            .field("invocations", &self.invocations().len())
            .finish()
    }
}

impl ScriptedRunner {
    /// Runner answering every invocation with `handler`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Invocation) -> Result<ToolOutput> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            missing: HashSet::new(),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Runner where every tool succeeds silently.
    pub fn succeeding() -> Self {
        Self::new(|_| Ok(ToolOutput::ok()))
    }

    /// Report `tools` as not installed from [`ToolRunner::locate`].
    pub fn without_tools(mut self, tools: &[&str]) -> Self {
        self.missing.extend(tools.iter().map(|t| t.to_string()));
        self
    }

    /// Invocations so far, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.log.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Program names invoked so far, in order.
    pub fn programs(&self) -> Vec<String> {
        self.invocations().into_iter().map(|i| i.program).collect()
    }

    /// Invocations of `program`.
    pub fn calls_to(&self, program: &str) -> Vec<Invocation> {
        self.invocations()
            .into_iter()
            .filter(|i| i.program == program)
            .collect()
    }
}

impl ToolRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        if let Ok(mut log) = self.log.lock() {
            log.push(invocation.clone());
        }
        (self.handler)(invocation)
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        if self.missing.contains(program) {
            None
        } else {
            Some(PathBuf::from(program))
        }
    }
}
