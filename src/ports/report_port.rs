//! Report generation port trait.

use crate::domain::dashboard::DashboardSnapshot;
use crate::domain::error::DcaError;

/// Port for writing allocation reports.
pub trait ReportPort {
    fn write(&self, snapshot: &DashboardSnapshot, output_path: &str) -> Result<(), DcaError>;
}
