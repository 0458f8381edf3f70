use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::recipe_parser::Language;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides RECIPE_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Local progress store (overrides RECIPE_STORE_PATH)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a recipe text file and print its sections
    Parse {
        #[arg(short, long)]
        recipe_file: PathBuf,
        #[arg(short, long, default_value = "en")]
        lang: Language,
        /// Print the parsed document as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log in with email and password and remember the token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Exchange an identity-provider id token for a backend token
    GoogleLogin {
        #[arg(long)]
        id_token: String,
    },
    Logout,
    /// Detect vegetables in a photo
    Detect {
        #[arg(short, long)]
        image: PathBuf,
    },
    /// Generate a recipe from ingredients
    Generate {
        #[arg(short, long, value_delimiter = ',', required = true)]
        ingredients: Vec<String>,
        #[arg(short, long, default_value = "")]
        preferences: String,
        /// Write the generated recipe to this file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Save a recipe file to your collection
    Save {
        #[arg(short, long)]
        recipe_file: PathBuf,
        #[arg(short, long, default_value = "en")]
        lang: Language,
    },
    /// List saved recipes
    Recipes,
    DeleteRecipe {
        id: String,
    },
    /// Start (or resume) cooking a recipe file
    Cook {
        #[arg(short, long)]
        recipe_file: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long, default_value = "en")]
        lang: Language,
        #[arg(long, default_value_t = 0)]
        step: usize,
    },
    /// Move to the next step of the current recipe
    Next,
    /// Move back one step
    Prev,
    /// Cook the current recipe again from the first step
    Restart,
    /// Switch the instruction language of the current recipe
    Lang {
        lang: Language,
    },
    /// Show where you are in the current recipe
    Status {
        /// Read the current step aloud
        #[arg(long)]
        speak: bool,
    },
    /// List your cook history
    History,
    /// Ask the cooking assistant about the current step
    Chat {
        message: String,
    },
    /// Run a countdown, by default for the duration named in the current step
    Timer {
        #[arg(short, long)]
        minutes: Option<u32>,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
