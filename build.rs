//! Build script rendering manual pages for `slicecast` and its subcommands.

use std::{fs, path::Path};

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli.rs"]
mod cli;

fn render(cmd: clap::Command, title: &str, out: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut buf: Vec<u8> = Vec::new();
    Man::new(cmd).title(title).render(&mut buf)?;
    fs::write(out, buf)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=src/cli.rs");

    let out_dir = Path::new("target/generated-man");
    fs::create_dir_all(out_dir)?;

    let cmd = cli::Cli::command();
    for sub in cmd.get_subcommands() {
        // `slicecast-send.1`, `slicecast-receive.1`
        let name = format!("{}-{}", cmd.get_name(), sub.get_name());
        render(sub.clone(), &name, &out_dir.join(format!("{name}.1")))?;
    }
    render(cmd, "slicecast", &out_dir.join("slicecast.1"))?;

    Ok(())
}
