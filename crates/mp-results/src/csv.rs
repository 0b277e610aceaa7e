//! CSV rendering of a trajectory.
//!
//! Header: `t`, state variables in layout order, control components.
//! One row per accepted step. Floats use `Display`, the shortest text that
//! parses back to the same bits.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use mp_sim::{Snapshot, Trajectory};

use crate::ResultsResult;

pub fn write_csv(path: &Path, trajectory: &Trajectory) -> ResultsResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_csv_to(&mut writer, trajectory)?;
    writer.flush()?;
    Ok(())
}

pub fn write_csv_to<W: Write>(writer: &mut W, trajectory: &Trajectory) -> io::Result<()> {
    writeln!(writer, "{}", trajectory.columns().join(","))?;
    for snapshot in trajectory.rows() {
        write_row(writer, snapshot)?;
    }
    Ok(())
}

fn write_row<W: Write>(writer: &mut W, snapshot: &Snapshot) -> io::Result<()> {
    write!(writer, "{}", snapshot.t)?;
    for value in snapshot.state.iter() {
        write!(writer, ",{value}")?;
    }
    for value in snapshot.control.components() {
        write!(writer, ",{value}")?;
    }
    writeln!(writer)
}
