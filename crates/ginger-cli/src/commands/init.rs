//! Project scaffolding

use crate::error::CliResult;
use crate::output::print_success;
use crate::session::GlobalArgs;
use clap::Args;
use ginger_store::{LocalState, ProjectLayout, StateWriter};
use ginger_types::function::validate_name;
use ginger_types::ProjectSettings;

#[derive(Args)]
pub struct InitArgs {
    /// Project name
    #[arg(short, long)]
    name: String,

    /// Default execution role for functions
    #[arg(long)]
    role: Option<String>,

    /// Storage bucket (defaults to ginger-<name>)
    #[arg(long)]
    bucket: Option<String>,

    /// Command run before every deploy
    #[arg(long)]
    hook: Option<String>,
}

pub fn execute(args: InitArgs, globals: &GlobalArgs) -> CliResult<()> {
    validate_name("project name", &args.name)?;

    let root = globals.start_dir()?;
    let layout = ProjectLayout::scaffold(&root)?;

    let mut settings = ProjectSettings::new(&args.name);
    if let Some(region) = &globals.region {
        settings.region = region.clone();
    }
    settings.profile = globals.profile.clone();
    settings.default_role = args.role;
    settings.bucket = args.bucket;
    settings.deploy_hook = args.hook;

    let state = LocalState::init(layout, settings);
    StateWriter::new().persist(&state)?;
    print_success(&format!(
        "Initialized project {} in {}",
        args.name,
        state.layout.root().display()
    ));
    Ok(())
}
