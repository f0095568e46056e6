//! Downstream metrics backends.

pub mod dogstatsd;
pub mod writer;

use crate::RelayResult;

/// A sink for processed metrics.
///
/// `tags` holds `key:value` strings and is empty for metrics forwarded under
/// their original name. `sample_rate` is the rate the emitter sampled at;
/// counters arrive already extrapolated with a rate of 1.
///
/// Implementations are shared by every worker thread.
pub trait MetricsBackend {
    /// Adds `value` to a counter.
    ///
    /// # Errors
    /// Returns an error if the metric could not be sent.
    fn count(&self, name: &str, value: i64, tags: &[String], sample_rate: f64) -> RelayResult<()>;

    /// Sets a gauge.
    ///
    /// # Errors
    /// Returns an error if the metric could not be sent.
    fn gauge(&self, name: &str, value: f64, tags: &[String], sample_rate: f64) -> RelayResult<()>;

    /// Records a timing in milliseconds.
    ///
    /// # Errors
    /// Returns an error if the metric could not be sent.
    fn timing(&self, name: &str, millis: f64, tags: &[String], sample_rate: f64)
        -> RelayResult<()>;

    /// Adds a member to a set.
    ///
    /// # Errors
    /// Returns an error if the metric could not be sent.
    fn set(&self, name: &str, member: &str, tags: &[String], sample_rate: f64) -> RelayResult<()>;

    /// Records a histogram sample.
    ///
    /// # Errors
    /// Returns an error if the metric could not be sent.
    fn histogram(
        &self,
        name: &str,
        value: f64,
        tags: &[String],
        sample_rate: f64,
    ) -> RelayResult<()>;
}

/// Backend that accepts and discards every metric.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBackend;

impl MetricsBackend for NoopBackend {
    fn count(&self, _: &str, _: i64, _: &[String], _: f64) -> RelayResult<()> {
        Ok(())
    }

    fn gauge(&self, _: &str, _: f64, _: &[String], _: f64) -> RelayResult<()> {
        Ok(())
    }

    fn timing(&self, _: &str, _: f64, _: &[String], _: f64) -> RelayResult<()> {
        Ok(())
    }

    fn set(&self, _: &str, _: &str, _: &[String], _: f64) -> RelayResult<()> {
        Ok(())
    }

    fn histogram(&self, _: &str, _: f64, _: &[String], _: f64) -> RelayResult<()> {
        Ok(())
    }
}
