//! Raw kernel statistics source
//!
//! All kernel ABI access lives behind the [`RawStatsSource`] trait: one
//! query for the clock tick rate (`kern.clockrate`) and one for the raw
//! per-state CPU tick buffer (`kern.cp_time`). Collectors only see the
//! trait, so tests swap in an in-memory source and the sysctl plumbing
//! stays in this module.
//!
//! Both queries are read-only and issued fresh on every collection cycle;
//! the kernel is the sole owner of the cumulative counters.

use crate::error::{HoststatError, Result};
use bytes::Bytes;

/// sysctl node for the kernel clock configuration.
pub const KERN_CLOCKRATE: &str = "kern.clockrate";

/// sysctl node for the cumulative per-state CPU tick counters.
pub const KERN_CP_TIME: &str = "kern.cp_time";

/// Narrow capability over the two kernel queries a collection cycle needs.
pub trait RawStatsSource: Send + Sync {
    /// Statistics clock rate in ticks per second. Guaranteed positive on
    /// success; an unreadable or non-positive rate is an error.
    fn clock_rate(&self) -> Result<f64>;

    /// Raw `kern.cp_time` buffer exactly as the kernel returned it. The
    /// length is kernel-controlled and must be validated by the decoder,
    /// never assumed.
    fn cpu_ticks(&self) -> Result<Bytes>;
}

/// The kernel `clockinfo` struct: five native-endian 32-bit integers in
/// this order. Decoded manually so the ABI layout is spelled out in one
/// place instead of relying on a C struct cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clockinfo {
    pub hz: i32,
    pub tick: i32,
    pub tickadj: i32,
    pub stathz: i32,
    pub profhz: i32,
}

impl Clockinfo {
    /// Encoded size of the struct in the sysctl reply.
    pub const ENCODED_LEN: usize = 5 * 4;

    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::ENCODED_LEN {
            return Err(HoststatError::Decode {
                what: "clockinfo",
                got: buf.len(),
                need: Self::ENCODED_LEN,
            });
        }

        let mut words = [0i32; 5];
        for (i, word) in words.iter_mut().enumerate() {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&buf[i * 4..i * 4 + 4]);
            *word = i32::from_ne_bytes(raw);
        }

        Ok(Self {
            hz: words[0],
            tick: words[1],
            tickadj: words[2],
            stathz: words[3],
            profhz: words[4],
        })
    }

    /// Rate of the statistics clock, which drives CPU time accounting.
    /// A kernel reporting a non-positive rate fails the cycle rather than
    /// letting a later division produce Inf or NaN.
    pub fn stat_hz(&self) -> Result<f64> {
        if self.stathz > 0 {
            Ok(f64::from(self.stathz))
        } else {
            Err(HoststatError::InvalidClockRate(f64::from(self.stathz)))
        }
    }
}

/// Live source backed by sysctl(3). Only functional on NetBSD; elsewhere
/// every query reports the platform as unsupported so the surrounding
/// scrape machinery still runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct KernelSource;

#[cfg(target_os = "netbsd")]
impl RawStatsSource for KernelSource {
    fn clock_rate(&self) -> Result<f64> {
        let buf = sys::sysctl_raw(KERN_CLOCKRATE)?;
        Clockinfo::decode(&buf)?.stat_hz()
    }

    fn cpu_ticks(&self) -> Result<Bytes> {
        Ok(Bytes::from(sys::sysctl_raw(KERN_CP_TIME)?))
    }
}

#[cfg(not(target_os = "netbsd"))]
impl RawStatsSource for KernelSource {
    fn clock_rate(&self) -> Result<f64> {
        Err(HoststatError::Unsupported(
            "kern.clockrate is only available on NetBSD",
        ))
    }

    fn cpu_ticks(&self) -> Result<Bytes> {
        Err(HoststatError::Unsupported(
            "kern.cp_time is only available on NetBSD",
        ))
    }
}

#[cfg(target_os = "netbsd")]
mod sys {
    use crate::error::{HoststatError, Result};
    use std::ffi::CString;
    use std::{io, ptr};

    /// Variable-length sysctl read: probe the size, then fetch.
    pub(super) fn sysctl_raw(name: &'static str) -> Result<Vec<u8>> {
        let cname = CString::new(name).map_err(|_| HoststatError::KernelQuery {
            name,
            source: io::Error::new(io::ErrorKind::InvalidInput, "NUL byte in sysctl name"),
        })?;

        let mut len: libc::size_t = 0;
        let rc = unsafe {
            libc::sysctlbyname(cname.as_ptr(), ptr::null_mut(), &mut len, ptr::null(), 0)
        };
        if rc != 0 {
            return Err(query_failed(name));
        }

        let mut buf = vec![0u8; len];
        let rc = unsafe {
            libc::sysctlbyname(
                cname.as_ptr(),
                buf.as_mut_ptr().cast(),
                &mut len,
                ptr::null(),
                0,
            )
        };
        if rc != 0 {
            return Err(query_failed(name));
        }

        // The kernel may hand back fewer bytes than the probe promised.
        buf.truncate(len);
        Ok(buf)
    }

    fn query_failed(name: &'static str) -> HoststatError {
        HoststatError::KernelQuery {
            name,
            source: io::Error::last_os_error(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clockinfo_buf(words: [i32; 5]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Clockinfo::ENCODED_LEN);
        for word in words {
            buf.extend_from_slice(&word.to_ne_bytes());
        }
        buf
    }

    #[test]
    fn decode_clockinfo_fields_in_kernel_order() {
        let buf = clockinfo_buf([100, 10000, 40, 100, 1000]);
        let info = Clockinfo::decode(&buf).unwrap();

        assert_eq!(
            info,
            Clockinfo {
                hz: 100,
                tick: 10000,
                tickadj: 40,
                stathz: 100,
                profhz: 1000,
            }
        );
    }

    #[test]
    fn decode_clockinfo_rejects_short_buffer() {
        let err = Clockinfo::decode(&[0u8; 12]).unwrap_err();
        match err {
            HoststatError::Decode { what, got, need } => {
                assert_eq!(what, "clockinfo");
                assert_eq!(got, 12);
                assert_eq!(need, Clockinfo::ENCODED_LEN);
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn decode_clockinfo_ignores_trailing_bytes() {
        let mut buf = clockinfo_buf([100, 10000, 40, 128, 1000]);
        buf.extend_from_slice(&[0xde, 0xad]);
        let info = Clockinfo::decode(&buf).unwrap();
        assert_eq!(info.stathz, 128);
    }

    #[test]
    fn stat_hz_requires_positive_rate() {
        let good = Clockinfo::decode(&clockinfo_buf([100, 10000, 40, 100, 1000])).unwrap();
        assert_eq!(good.stat_hz().unwrap(), 100.0);

        let zero = Clockinfo::decode(&clockinfo_buf([100, 10000, 40, 0, 1000])).unwrap();
        assert!(matches!(
            zero.stat_hz().unwrap_err(),
            HoststatError::InvalidClockRate(_)
        ));

        let negative = Clockinfo::decode(&clockinfo_buf([100, 10000, 40, -7, 1000])).unwrap();
        assert!(matches!(
            negative.stat_hz().unwrap_err(),
            HoststatError::InvalidClockRate(_)
        ));
    }

    #[cfg(not(target_os = "netbsd"))]
    #[test]
    fn kernel_source_reports_unsupported_elsewhere() {
        let source = KernelSource;
        assert!(matches!(
            source.clock_rate().unwrap_err(),
            HoststatError::Unsupported(_)
        ));
        assert!(matches!(
            source.cpu_ticks().unwrap_err(),
            HoststatError::Unsupported(_)
        ));
    }
}
