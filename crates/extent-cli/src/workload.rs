use std::collections::HashMap;

use anyhow::{Result, bail};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, info};

use extent_rs::{ExtentError, ExtentStore, InodeKind};

/// Upper bound on live files so removals keep pace with creates.
const MAX_LIVE: usize = 64;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkloadReport {
    pub creates: u32,
    pub puts: u32,
    pub gets: u32,
    pub removes: u32,
    pub rejected_puts: u32,
    pub bytes_written: u64,
    pub bytes_read: u64,
}

/// Seeded create/put/get/remove mix. Every read is compared against a shadow
/// copy of what the store should hold.
pub struct SyntheticWorkload {
    rng: StdRng,
    max_size: usize,
    shadow: HashMap<u32, Vec<u8>>,
    report: WorkloadReport,
}

impl SyntheticWorkload {
    pub fn new(seed: u64, max_size: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            max_size,
            shadow: HashMap::new(),
            report: WorkloadReport::default(),
        }
    }

    /// # Errors
    /// Fails if the store returns data that differs from the shadow copy or an
    /// error the workload does not expect.
    pub fn run<S: ExtentStore>(mut self, store: &mut S, ops: u32) -> Result<WorkloadReport> {
        for step in 0..ops {
            let roll: f64 = self.rng.random();
            if self.shadow.is_empty() || (roll < 0.15 && self.shadow.len() < MAX_LIVE) {
                self.create(store)?;
            } else if roll < 0.55 {
                self.put(store)?;
            } else if roll < 0.90 {
                self.get(store)?;
            } else {
                self.remove(store)?;
            }
            if step % 1000 == 999 {
                debug!(step = step + 1, live = self.shadow.len(), "workload progress");
            }
        }
        for (&inum, expected) in &self.shadow {
            if store.get(inum)? != *expected {
                bail!("final check: inode {inum} does not match its shadow copy");
            }
        }
        info!(
            "workload: creates={}, puts={}, gets={}, removes={}, rejected_puts={}",
            self.report.creates,
            self.report.puts,
            self.report.gets,
            self.report.removes,
            self.report.rejected_puts
        );
        Ok(self.report)
    }

    fn create<S: ExtentStore>(&mut self, store: &mut S) -> Result<()> {
        let inum = store.create(InodeKind::File)?;
        if self.shadow.insert(inum, Vec::new()).is_some() {
            bail!("create handed out live inode {inum}");
        }
        let attr = store.getattr(inum)?;
        if !attr.is_file() || attr.size != 0 {
            bail!("new inode {inum} is not an empty file");
        }
        self.report.creates += 1;
        Ok(())
    }

    fn put<S: ExtentStore>(&mut self, store: &mut S) -> Result<()> {
        let inum = self.pick_live();
        let len = self.pick_len();
        let mut data = vec![0u8; len];
        self.rng.fill(data.as_mut_slice());

        match store.put(inum, &data) {
            Ok(()) => {
                self.report.puts += 1;
                self.report.bytes_written += len as u64;
                self.shadow.insert(inum, data);
            }
            Err(ExtentError::NoSpace { .. } | ExtentError::FileTooLarge(_)) => {
                self.report.rejected_puts += 1;
            }
            Err(err) => return Err(err.into()),
        }
        let size = store.getattr(inum)?.size as usize;
        let expected = self.shadow.get(&inum).map_or(0, Vec::len);
        if size != expected {
            bail!("inode {inum} reports size {size}, expected {expected}");
        }
        Ok(())
    }

    fn get<S: ExtentStore>(&mut self, store: &mut S) -> Result<()> {
        let inum = self.pick_live();
        let data = store.get(inum)?;
        if self.shadow.get(&inum) != Some(&data) {
            bail!("inode {inum} returned {} bytes that differ from its shadow copy", data.len());
        }
        self.report.gets += 1;
        self.report.bytes_read += data.len() as u64;
        Ok(())
    }

    fn remove<S: ExtentStore>(&mut self, store: &mut S) -> Result<()> {
        let inum = self.pick_live();
        store.remove(inum)?;
        self.shadow.remove(&inum);
        match store.get(inum) {
            Err(ExtentError::NotFound(_)) => {}
            other => bail!("removed inode {inum} still readable: {:?}", other.map(|d| d.len())),
        }
        self.report.removes += 1;
        Ok(())
    }

    fn pick_live(&mut self) -> u32 {
        let mut live: Vec<u32> = self.shadow.keys().copied().collect();
        live.sort_unstable();
        live[self.rng.random_range(0..live.len())]
    }

    fn pick_len(&mut self) -> usize {
        // Bias towards sizes around the direct/indirect boundary.
        let choices = [0usize, 1, 511, 512, 513, 16_383, 16_384, 16_385, 16_897];
        if self.rng.random_bool(0.4) {
            choices[self.rng.random_range(0..choices.len())].min(self.max_size)
        } else {
            self.rng.random_range(0..=self.max_size)
        }
    }
}
