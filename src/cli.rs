use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "phrm-api")]
#[command(about = "Personal Health Records Manager API server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, env = "PHRM_HOST", help = "Address to bind, overrides the profile")]
        host: Option<String>,

        #[arg(long, help = "Port to bind, overrides the profile")]
        port: Option<u16>,
    },

    #[command(about = "Create the database schema and exit")]
    Migrate,

    #[command(about = "Create an account with superuser rights, or promote an existing one")]
    CreateSuperuser {
        #[arg(long)]
        email: String,

        #[arg(long, env = "PHRM_SUPERUSER_PASSWORD", help = "Only used when the account does not exist yet")]
        password: String,
    },
}

impl Cli {
    /// `serve` with profile defaults when no subcommand is given
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Serve { host: None, port: None })
    }
}
