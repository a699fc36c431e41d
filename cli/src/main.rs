// Copyright 2026 the mywellness_tcx_convert authors
//
// This file is part of mywellness_tcx_convert.
//
// mywellness_tcx_convert is free software: you can redistribute it and/or
// modify it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the License,
// or (at your option) any later version.
//
// mywellness_tcx_convert is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero
// General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with mywellness_tcx_convert. If not, see
// <https://www.gnu.org/licenses/>.

//! This is a very simple command-line interface for the MyWellness-to-TCX
//! converter.

use std::{
    env,
    error::Error,
    fs::{self, File},
    path::{Path, PathBuf},
    process::ExitCode,
};

use mywellness_tcx_convert::convert;

/// Converts the given JSON export into a `.tcx` file in the current working
/// directory, named after the input file.
fn main() -> ExitCode {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "mywellness_tcx_convert".into());
    let Some(input) = args.next() else {
        eprintln!("Usage: {program} <input_json_file>");
        return ExitCode::FAILURE;
    };

    match run(Path::new(&input)) {
        Ok(output) => {
            println!("Converted JSON to TCX: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Conversion failed with: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn run(input: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let source = File::open(input)?;

    // Buffer the document so a failed conversion leaves no partial file.
    let mut sink = vec![];
    convert(source, &mut sink)?;

    let output = output_path(input);
    fs::write(&output, sink)?;
    Ok(output)
}

/// The input's base name with its extension swapped for `.tcx`, relative to
/// the current working directory.
fn output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_else(|| input.as_os_str());
    PathBuf::from(stem).with_extension("tcx")
}
