//! Output lines
//!
//! Everything user-visible is written through these helpers so the wording
//! stays in one place. Writing never affects control flow beyond returning
//! sink errors.

use crate::compute::model::{Instance, OperationStatus};
use std::io::{self, Write};

pub fn instance_created<W: Write>(out: &mut W, name: &str) -> io::Result<()> {
    writeln!(out, "Instance created: {}", name)
}

pub fn instance_deleted<W: Write>(out: &mut W, name: &str) -> io::Result<()> {
    writeln!(out, "Instance deleted: {}", name)
}

pub fn zone_header<W: Write>(out: &mut W, zone: &str) -> io::Result<()> {
    writeln!(out, "Instances found in zone {}:", zone)
}

pub fn aggregated_header<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "Instances found:")
}

/// Zone key line of the aggregated listing, e.g. `zones/us-central1-a`
pub fn zone_key<W: Write>(out: &mut W, key: &str) -> io::Result<()> {
    writeln!(out, "{}", key)
}

pub fn instance_line<W: Write>(out: &mut W, instance: &Instance) -> io::Result<()> {
    writeln!(out, "- {} {}", instance.name, instance.machine_type)
}

pub fn operation_finished<W: Write>(
    out: &mut W,
    name: &str,
    status: &OperationStatus,
) -> io::Result<()> {
    writeln!(out, "Operation finished: {} ({})", name, status)
}
