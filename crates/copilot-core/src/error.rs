use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum CopilotError {
    #[error("no application specified: pass its name or run inside a workspace")]
    MissingApplication,

    #[error("operation cancelled")]
    OperationCancelled,

    #[error("only one of --since or --start-time may be used")]
    SinceWithStartTime,

    #[error("only one of --follow or --end-time may be used")]
    FollowWithEndTime,

    #[error("--since must be positive")]
    NonPositiveSince,

    #[error("--since reaches too far into the past")]
    SinceOutOfRange,

    #[error("--limit {0} is out of bounds: must be between 1 and 10000")]
    LimitOutOfRange(u32),

    #[error("invalid {flag} '{value}': expected an RFC 3339 timestamp such as 2006-01-02T15:04:05+07:00")]
    InvalidTimestamp {
        flag: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("invalid duration '{0}': expected a value such as 90s, 5m or 1h30m")]
    InvalidDuration(String),

    #[error("application not found: {0}")]
    ApplicationNotFound(String),

    #[error("environment '{env}' not found in application '{app}'")]
    EnvironmentNotFound { app: String, env: String },

    #[error("workload '{name}' not found in application '{app}'")]
    WorkloadNotFound { app: String, name: String },

    #[error("no applications found: run 'copilot app init' first")]
    NoApplications,

    #[error("no deployed workloads found in application '{0}'")]
    NoDeployedWorkloads(String),

    #[error("no workload selected: run ask before execute")]
    TargetNotSelected,

    #[error("no pipeline found in this workspace")]
    NoPipelineInWorkspace,

    #[error("stack not found: {0}")]
    StackNotFound(String),

    #[error(
        "environment '{env}' still has workload resources: {}; delete its services and jobs first",
        resources.join(", ")
    )]
    EnvironmentHasResources { env: String, resources: Vec<String> },

    #[error("{context}")]
    Context {
        context: String,
        #[source]
        source: Box<CopilotError>,
    },

    #[error(transparent)]
    Remote(BoxError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CopilotError>;

impl CopilotError {
    pub fn remote(err: impl Into<BoxError>) -> Self {
        CopilotError::Remote(err.into())
    }

    /// The innermost error beneath any `Context` layers.
    pub fn root(&self) -> &CopilotError {
        let mut err = self;
        while let CopilotError::Context { source, .. } = err {
            err = source;
        }
        err
    }

    pub fn is_stack_not_found(&self) -> bool {
        matches!(self.root(), CopilotError::StackNotFound(_))
    }

    pub fn is_no_pipeline(&self) -> bool {
        matches!(self.root(), CopilotError::NoPipelineInWorkspace)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), CopilotError::OperationCancelled)
    }

    pub fn is_application_not_found(&self) -> bool {
        matches!(self.root(), CopilotError::ApplicationNotFound(_))
    }

    /// Render the full chain of attempted steps, outermost first.
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut next = std::error::Error::source(self);
        while let Some(err) = next {
            out.push_str(": ");
            out.push_str(&err.to_string());
            next = err.source();
        }
        out
    }
}

/// Attach "what was being attempted" text to a core error.
pub trait ResultExt<T> {
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|source| CopilotError::Context {
            context: f().into(),
            source: Box::new(source),
        })
    }
}

/// Treat "already gone" as success.
pub(crate) fn ignore_absent(result: Result<()>) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.is_stack_not_found() => {
            tracing::warn!(error = %e, "stack already deleted");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
