#[cfg(feature = "cli")]
mod real {
    use clap::Parser;
    use std::path::PathBuf;

    #[derive(Parser)]
    #[command(about = "Generate a lexer/parser pair from a combined spec file")]
    struct Args {
        /// Path to the combined lexical+grammar specification
        #[arg(default_value = "rules.txt")]
        spec: PathBuf,

        /// Directory for the generated sources
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Keep going when the grammar has LR conflicts (first action wins)
        #[arg(long)]
        allow_conflicts: bool,

        /// Also write report.txt (DFA, item sets, ACTION/GOTO tables)
        #[arg(long)]
        report: bool,
    }

    pub fn main() -> anyhow::Result<()> {
        env_logger::init();

        let args = Args::parse();
        let summary = lexlr::driver::generate(
            &args.spec,
            &args.out_dir,
            args.allow_conflicts,
            args.report,
        )?;
        if !summary.conflicts.is_empty() {
            eprintln!(
                "warning: {} conflict(s) resolved first-wins",
                summary.conflicts.len()
            );
        }
        Ok(())
    }
}

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    real::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("lexlr disabled (compiled without `cli` feature)");
}
