use std::time::SystemTime;

/// Conversion of `SystemTime` into the epoch-seconds representation used
/// on the wire. Snapshot timestamps travel as `f64` so that the encoding
/// stays limited to strings, integers and floats.
pub trait SystemTimeExt {
    /// Seconds since the Unix epoch, negative for pre-epoch times.
    fn to_epoch_secs(&self) -> f64;
}

impl SystemTimeExt for SystemTime {
    fn to_epoch_secs(&self) -> f64 {
        match self.duration_since(SystemTime::UNIX_EPOCH) {
            Ok(since) => since.as_secs_f64(),
            Err(before) => -before.duration().as_secs_f64(),
        }
    }
}
