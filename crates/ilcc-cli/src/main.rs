use ilcc::CompileOutcome;
use std::env;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let Some(file_path) = args.get(1) else {
        eprintln!("usage: ilcc <source-file>");
        return ExitCode::from(255);
    };

    let source = match read_file(file_path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(255);
        }
    };

    match ilcc::compile_source(&source) {
        CompileOutcome::Success { assembly } => {
            let output_path = output_path_for(file_path);
            if let Err(err) = fs::write(&output_path, assembly) {
                eprintln!("error writing {}: {err}", output_path.display());
                return ExitCode::from(255);
            }
            ExitCode::SUCCESS
        }
        CompileOutcome::SyntaxError { message } => {
            eprintln!("syntax error: {message}");
            ExitCode::from(100)
        }
        CompileOutcome::SemanticError { rendered } => {
            eprintln!("{rendered}");
            ExitCode::from(200)
        }
    }
}

fn read_file(file_path: &str) -> Result<String, String> {
    match fs::metadata(file_path) {
        Ok(metadata) if metadata.is_file() => {}
        Ok(_) => return Err(format!("{file_path} is not a file")),
        Err(err) => return Err(format!("reading {file_path}: {err}")),
    }
    fs::read_to_string(file_path).map_err(|err| format!("reading file: {err}"))
}

fn output_path_for(file_path: &str) -> std::path::PathBuf {
    Path::new(file_path).with_extension("s")
}
