/// Context for processing one volume of one work
///
/// Carries the identifiers and positions the flow needs for key derivation
/// and log prefixes; holds no resources.
#[derive(Clone, Debug)]
pub struct VolumeCtx {
    /// Local id of the owning work, e.g. `W22084`
    pub work_local_id: String,
    /// Imagegroup id of this volume, e.g. `I0886`
    pub imagegroup: String,
    /// 1-based position of the work in the batch (for logs)
    pub work_index: usize,
    /// 1-based position of the volume within the work (for logs)
    pub volume_index: usize,
    /// Number of volumes in the work (for logs)
    pub total_volumes: usize,
}

impl VolumeCtx {
    pub fn new(
        work_local_id: impl Into<String>,
        imagegroup: impl Into<String>,
        work_index: usize,
        volume_index: usize,
        total_volumes: usize,
    ) -> Self {
        Self {
            work_local_id: work_local_id.into(),
            imagegroup: imagegroup.into(),
            work_index,
            volume_index,
            total_volumes,
        }
    }
}
