pub mod exporter;

pub use exporter::PrometheusExporter;

/// Namespace prefixed to every metric this exporter owns.
pub const NAMESPACE: &str = "hoststat";
