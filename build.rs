//! Build script rendering the `knife-joyent` man pages into `OUT_DIR`.
//!
//! One page is written for the top-level command and one for each
//! subcommand group (`knife-joyent-server.1`, `knife-joyent-flavor.1`).

use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli/mod.rs"]
mod cli;

use cli::Cli;

const GROUP_PAGES: [(&str, &str); 2] = [
    ("server", "knife-joyent-server"),
    ("flavor", "knife-joyent-flavor"),
];

fn render(command: clap::Command, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut buffer = Vec::new();
    Man::new(command).render(&mut buffer)?;
    fs::write(path, buffer)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout();
    writeln!(stdout, "cargo:rerun-if-changed=build.rs")?;
    writeln!(stdout, "cargo:rerun-if-changed=src/cli/mod.rs")?;

    let out_dir = env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or("OUT_DIR was not set")?;

    let root = Cli::command();
    for (group, page_name) in GROUP_PAGES {
        let page = root
            .find_subcommand(group)
            .ok_or_else(|| format!("missing subcommand {group}"))?
            .clone()
            .name(page_name);
        render(page, &out_dir.join(format!("{page_name}.1")))?;
    }
    render(root, &out_dir.join("knife-joyent.1"))?;

    Ok(())
}
