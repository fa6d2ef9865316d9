use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "slack-emoji-survey")]
#[command(about = "Survey emoji usage across public Slack channels and report a ranking")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run an interactive emoji usage survey over the last year
    Survey,
}
