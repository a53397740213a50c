use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "checkgate")]
#[command(
    author,
    version,
    about = "Quality-gate checklists with inheritance, override sources and execution tracking"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file (searches upward for checkgate.toml by default)
    #[arg(long, global = true, env = "CHECKGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write JSON logs to a file (platform data directory when no path is given)
    #[arg(long, global = true, num_args = 0..=1, value_name = "PATH")]
    pub log_file: Option<Option<PathBuf>>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new checkgate project
    Init {
        /// Core checklist directory to create
        #[arg(long, default_value = "checklists")]
        checklists_dir: String,

        /// Skip writing the starter checklist
        #[arg(long)]
        bare: bool,
    },

    /// Validate checklist files against the schema rules
    Validate {
        /// File or directory to validate (defaults to all core and override directories)
        path: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List available checklists and the source they resolve from
    #[command(visible_alias = "ls")]
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render a resolved checklist (inheritance applied) as markdown
    Show {
        /// Checklist name (stem or category/stem)
        name: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report which source a checklist resolves from
    Source {
        /// Checklist name (stem or category/stem)
        name: String,
    },

    /// Record checklist executions step by step
    #[command(subcommand)]
    Track(TrackAction),

    /// Record a complete execution from a JSON results document
    Import {
        /// JSON file to import ('-' reads stdin)
        file: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show an execution and its item results
    Results {
        /// Execution ID
        id: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the failed items of an execution
    Failed {
        /// Execution ID
        id: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show recent executions of a checklist with statistics
    History {
        /// Checklist name
        name: String,

        /// Maximum number of executions to list
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show executions recorded for a story
    Story {
        /// Epic number
        epic: i64,

        /// Story number
        story: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show pass rates of completed executions
    Compliance {
        /// Restrict to one artifact type
        #[arg(short = 't', long = "type", value_enum)]
        artifact_type: Option<ArtifactTypeArg>,

        /// Only executions started on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,

        /// Only executions started on or before this date (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List required checklists not yet completed for an artifact
    Pending {
        /// Artifact type
        #[arg(value_enum)]
        artifact_type: ArtifactTypeArg,

        /// Artifact identifier
        artifact_id: String,

        /// Required checklist names
        #[arg(short, long = "require", required = true)]
        required: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum TrackAction {
    /// Start a new execution and print its ID
    Start {
        /// Checklist name; the version is taken from the resolved checklist
        checklist: String,

        /// Artifact type
        #[arg(short = 't', long = "type", value_enum)]
        artifact_type: ArtifactTypeArg,

        /// Artifact identifier
        #[arg(short, long)]
        artifact: String,

        /// Who runs the checklist
        #[arg(long, env = "CHECKGATE_USER", default_value = "unknown")]
        by: String,

        /// Epic number
        #[arg(long, requires = "story")]
        epic: Option<i64>,

        /// Story number
        #[arg(long, requires = "epic")]
        story: Option<i64>,

        /// Workflow identifier
        #[arg(long)]
        workflow: Option<String>,
    },

    /// Record one item outcome
    Record {
        /// Execution ID
        id: i64,

        /// Checklist item ID
        item: String,

        /// Item outcome
        #[arg(value_enum)]
        status: ItemStatusArg,

        /// Notes (required for fail and skip)
        #[arg(short, long)]
        notes: Option<String>,

        /// Path to supporting evidence
        #[arg(long)]
        evidence: Option<String>,
    },

    /// Complete an execution and derive its status
    Complete {
        /// Execution ID
        id: i64,

        /// Closing notes
        #[arg(short, long)]
        notes: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ArtifactTypeArg {
    Story,
    Epic,
    Prd,
    Architecture,
    Code,
}

impl From<ArtifactTypeArg> for crate::model::ArtifactType {
    fn from(arg: ArtifactTypeArg) -> Self {
        match arg {
            ArtifactTypeArg::Story => crate::model::ArtifactType::Story,
            ArtifactTypeArg::Epic => crate::model::ArtifactType::Epic,
            ArtifactTypeArg::Prd => crate::model::ArtifactType::Prd,
            ArtifactTypeArg::Architecture => crate::model::ArtifactType::Architecture,
            ArtifactTypeArg::Code => crate::model::ArtifactType::Code,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ItemStatusArg {
    Pass,
    Fail,
    Skip,
    Na,
}

impl From<ItemStatusArg> for crate::model::ItemStatus {
    fn from(arg: ItemStatusArg) -> Self {
        match arg {
            ItemStatusArg::Pass => crate::model::ItemStatus::Pass,
            ItemStatusArg::Fail => crate::model::ItemStatus::Fail,
            ItemStatusArg::Skip => crate::model::ItemStatus::Skip,
            ItemStatusArg::Na => crate::model::ItemStatus::Na,
        }
    }
}
