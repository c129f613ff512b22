use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "flowbot")]
#[command(about = "Drive the Flow video studio: sign in, generate, download")]
#[command(version)]
pub struct Cli {
    /// Increase verbosity (-v debug for flowbot, -vv trace for everything)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Run the browser without a visible window
    #[arg(long, global = true)]
    pub headless: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the workflow once and print the saved file path
    Run {
        /// Prompt to generate from (defaults to FLOWBOT_PROMPT)
        #[arg(short, long)]
        prompt: Option<String>,

        /// File name for the downloaded artifact
        #[arg(short, long, value_name = "NAME")]
        output: Option<String>,

        /// Assume the browser profile is already signed in
        #[arg(long)]
        skip_login: bool,
    },

    /// Sign in, open the editor and keep the browser up until Ctrl-C
    #[command(alias = "i")]
    Interactive,
}
