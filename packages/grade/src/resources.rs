// ABOUTME: Translates user-facing resource quotas into container runtime limits
// ABOUTME: Memory is expressed in whole gigabytes and CPU reservations in fixed vCPU steps

use std::fmt;
use thiserror::Error;

const MB_PER_GB: u64 = 1024;
const BYTES_PER_GB: i64 = 1024 * 1024 * 1024;
const NANO_CPUS_PER_CPU: i64 = 1_000_000_000;

/// CPU counts the production grading environment can reserve
pub const ALLOWED_CPU_COUNTS: [u32; 3] = [1, 2, 4];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryFormatError {
    #[error("mem-limit must be a multiple of 1024.")]
    Unaligned { megabytes: u64 },
    #[error("mem-limit of {megabytes} MB is larger than the container runtime accepts.")]
    TooLarge { megabytes: u64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid CPU value. Please choose a value of 1, 2, or 4")]
pub struct CpuFormatError {
    pub count: u32,
}

/// Memory cap in whole gigabytes, rendered the way the runtime expects ("2g")
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLimit {
    gigabytes: u64,
    bytes: i64,
}

impl MemoryLimit {
    pub fn gigabytes(&self) -> u64 {
        self.gigabytes
    }

    pub fn bytes(&self) -> i64 {
        self.bytes
    }
}

impl fmt::Display for MemoryLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}g", self.gigabytes)
    }
}

/// Reserved CPU share for the grader container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuQuota {
    count: u32,
}

impl CpuQuota {
    /// Reservation in CPU units, 1024 per vCPU
    pub fn reserved_units(&self) -> u32 {
        self.count * 1024
    }

    pub fn nano_cpus(&self) -> i64 {
        self.count as i64 * NANO_CPUS_PER_CPU
    }
}

/// Translate a megabyte quota into whole gigabytes.
///
/// Zero is accepted and becomes `"0g"`, which Docker treats as no memory cap.
pub fn translate_memory(megabytes: u64) -> Result<MemoryLimit, MemoryFormatError> {
    if megabytes % MB_PER_GB != 0 {
        return Err(MemoryFormatError::Unaligned { megabytes });
    }

    let gigabytes = megabytes / MB_PER_GB;
    let bytes = i64::try_from(gigabytes)
        .ok()
        .and_then(|gb| gb.checked_mul(BYTES_PER_GB))
        .ok_or(MemoryFormatError::TooLarge { megabytes })?;

    Ok(MemoryLimit { gigabytes, bytes })
}

pub fn translate_cpus(count: u32) -> Result<CpuQuota, CpuFormatError> {
    if ALLOWED_CPU_COUNTS.contains(&count) {
        Ok(CpuQuota { count })
    } else {
        Err(CpuFormatError { count })
    }
}
