use toroid_core::{derive_substream_seed, RngHandle};

/// Derives the deterministic seed used for job `job_index` of a scan.
pub fn job_seed(master_seed: u64, job_index: usize) -> u64 {
    derive_substream_seed(master_seed, job_index as u64)
}

/// Derives the seed of the bootstrap stream belonging to a run seed.
///
/// The replicate count never perturbs the dynamics stream.
pub fn bootstrap_seed(run_seed: u64) -> u64 {
    derive_substream_seed(run_seed ^ 0xB007_57A9_B007_57A9, 0)
}

/// Dynamics and bootstrap generators for one run.
pub fn run_streams(run_seed: u64) -> (RngHandle, RngHandle) {
    (
        RngHandle::from_seed(run_seed),
        RngHandle::from_seed(bootstrap_seed(run_seed)),
    )
}
