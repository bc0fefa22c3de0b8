use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use sme::{module_to_json, Diagnostic, Snapshot};
use sme_compiler::{compile_sources, Module, SmeError};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

const DEFAULT_SME_DIR: &str = "./sme";
const SME_EXTENSION:   &str = "sme";

#[derive(Parser)]
#[command(name = "smec")]
#[command(about = "Check or build SME schema directories", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and verify every `.sme` file of a directory
    Check {
        /// Directory searched recursively for `.sme` files (defaults to `./sme`)
        #[arg(long)]
        sme_files_dir: Option<PathBuf>,

        /// Print the compiled module as JSON
        #[arg(long)]
        dump: bool,
    },

    /// Compile a directory and write the module snapshot for a target language
    Build {
        /// Directory searched recursively for `.sme` files (defaults to `./sme`)
        #[arg(long)]
        sme_files_dir: Option<PathBuf>,

        /// Language to generate the code for
        #[arg(long, value_enum)]
        out_lang: OutLang,

        /// Where to write the output (created when missing)
        #[arg(long)]
        out_dir: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutLang {
    Cpp,
    Java,
    Go,
    Python,
}

impl OutLang {
    fn as_str(self) -> &'static str {
        match self {
            OutLang::Cpp    => "cpp",
            OutLang::Java   => "java",
            OutLang::Go     => "go",
            OutLang::Python => "python",
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when the schemas produced diagnostics.
fn run(command: &Commands) -> Result<bool, SmeError> {
    match command {
        Commands::Check { sme_files_dir, dump } => {
            let dir = sme_files_dir_or_default(sme_files_dir.as_deref())?;
            let Some(module) = compile_dir(&dir)? else {
                return Ok(false);
            };
            if *dump {
                println!("{}", module_to_json(&module)?);
            }
            println!("Checked {}: {} package(s)", dir.display(), module.packages().len());
            Ok(true)
        }

        Commands::Build { sme_files_dir, out_lang, out_dir } => {
            let dir = sme_files_dir_or_default(sme_files_dir.as_deref())?;
            prepare_out_dir(out_dir)?;
            let Some(module) = compile_dir(&dir)? else {
                return Ok(false);
            };
            let out_path = out_dir.join(format!("module.{}.json", out_lang.as_str()));
            let json = Snapshot::for_language(&module, out_lang.as_str()).to_json()?;
            fs::write(&out_path, json)?;
            println!("Compiled {} → {}", dir.display(), out_path.display());
            Ok(true)
        }
    }
}

fn sme_files_dir_or_default(dir: Option<&Path>) -> Result<PathBuf, SmeError> {
    let dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => {
            eprintln!(
                "Warning: no path specified for .sme files, using default {} directory instead",
                DEFAULT_SME_DIR
            );
            PathBuf::from(DEFAULT_SME_DIR)
        }
    };
    if !dir.is_dir() {
        return Err(SmeError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("incorrect path specified for directory with sme files: {}", dir.display()),
        )));
    }
    Ok(dir)
}

fn prepare_out_dir(out_dir: &Path) -> Result<(), SmeError> {
    if !out_dir.exists() {
        debug!(dir = %out_dir.display(), "creating output directory");
        fs::create_dir_all(out_dir)?;
    }
    Ok(())
}

/// Every `.sme` file under `dir`, in sorted path order.
fn collect_sme_files(dir: &Path) -> Result<Vec<PathBuf>, SmeError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().and_then(|e| e.to_str()) == Some(SME_EXTENSION)
        {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

/// Reads every file. A file that cannot be read becomes a diagnostic and the
/// remaining files are still read.
fn read_sources(files: Vec<PathBuf>) -> (Vec<(PathBuf, String)>, Vec<Diagnostic>) {
    let mut sources = Vec::with_capacity(files.len());
    let mut diagnostics = Vec::new();
    for path in files {
        match fs::read_to_string(&path) {
            Ok(text) => sources.push((path, text)),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "unable to read schema file");
                diagnostics.push(Diagnostic::in_file(path, SmeError::Io(e)));
            }
        }
    }
    (sources, diagnostics)
}

/// Compiles the directory, printing every diagnostic. `None` when any was produced.
fn compile_dir(dir: &Path) -> Result<Option<Module>, SmeError> {
    let files = collect_sme_files(dir)?;
    info!(dir = %dir.display(), files = files.len(), "compiling schema directory");

    let (sources, mut diagnostics) = read_sources(files);
    match compile_sources(&sources) {
        Ok(module) if diagnostics.is_empty() => return Ok(Some(module)),
        Ok(_) => {}
        Err(compile_diagnostics) => diagnostics.extend(compile_diagnostics),
    }
    print_diagnostics(&diagnostics);
    Ok(None)
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("Error: {}", diagnostic);
    }
    eprintln!("{} error(s) found", diagnostics.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("smec-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_unreadable_file_does_not_stop_the_batch() {
        let dir = scratch_dir("unreadable");
        let good = dir.join("a.sme");
        let bad = dir.join("b.sme");
        fs::write(&good, "syntax 1.0.0\npackage a\nstruct A {\n}").unwrap();
        fs::write(&bad, [0xffu8, 0xfe, 0x00]).unwrap();
        let missing = dir.join("c.sme");

        let (sources, diagnostics) = read_sources(vec![good.clone(), bad.clone(), missing.clone()]);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].0, good);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].file.as_deref(), Some(bad.as_path()));
        assert_eq!(diagnostics[1].file.as_deref(), Some(missing.as_path()));
        assert!(matches!(diagnostics[0].error, SmeError::Io(_)));
        assert!(diagnostics[0].to_string().starts_with(&bad.display().to_string()));

        assert!(compile_dir(&dir).unwrap().is_none());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_collect_sme_files_sorted() {
        let dir = scratch_dir("collect");
        fs::create_dir_all(dir.join("nested")).unwrap();
        for name in ["b.sme", "a.sme", "nested/c.sme", "notes.txt"] {
            fs::write(dir.join(name), "").unwrap();
        }

        let files = collect_sme_files(&dir).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(&dir).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.sme"),
                PathBuf::from("b.sme"),
                PathBuf::from("nested").join("c.sme"),
            ]
        );
        fs::remove_dir_all(&dir).unwrap();
    }
}
