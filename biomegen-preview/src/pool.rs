//! Worker threads classifying regions of a shared biome source.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{trace, warn};

use biomegen::BiomeSource;
use biomegen::biome::CoverageGap;
use biomegen::source::RegionBiomes;


/// A region classified by a worker.
pub struct RegionResult {
    pub rx: i32,
    pub rz: i32,
    pub biomes: Result<Arc<RegionBiomes>, CoverageGap>,
}


/// A fixed set of threads sharing one source, requests are distributed to whichever
/// worker is free.
pub struct RegionPool {
    request_sender: Option<Sender<(i32, i32)>>,
    result_receiver: Receiver<RegionResult>,
    handles: Vec<JoinHandle<()>>,
}

impl RegionPool {

    pub fn new(source: Arc<BiomeSource>, workers_count: usize) -> Self {

        let (request_sender, request_receiver) = unbounded();
        let (result_sender, result_receiver) = unbounded();

        let handles = (0..workers_count).map(|i| {

            let worker = Worker {
                source: Arc::clone(&source),
                request_receiver: request_receiver.clone(),
                result_sender: result_sender.clone(),
            };

            thread::Builder::new()
                .name(format!("Region Worker #{i}"))
                .spawn(move || worker.run())
                .unwrap()

        }).collect();

        Self {
            request_sender: Some(request_sender),
            result_receiver,
            handles,
        }

    }

    /// Request a region to be classified.
    pub fn request(&self, rx: i32, rz: i32) {
        if let Some(sender) = &self.request_sender {
            sender.send((rx, rz)).expect("worker threads should not disconnect");
        }
    }

    /// Block until the next region is classified.
    pub fn recv(&self) -> Option<RegionResult> {
        self.result_receiver.recv().ok()
    }

}

impl Drop for RegionPool {

    fn drop(&mut self) {
        // Closing the request channel stops all workers.
        self.request_sender = None;
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }

}


struct Worker {
    source: Arc<BiomeSource>,
    request_receiver: Receiver<(i32, i32)>,
    result_sender: Sender<RegionResult>,
}

impl Worker {

    fn run(self) {

        while let Ok((rx, rz)) = self.request_receiver.recv() {

            let biomes = self.source.region_biomes(rx, rz);
            match &biomes {
                Ok(_) => trace!("classified region {rx}/{rz}"),
                Err(gap) => warn!("region {rx}/{rz} not classified: {gap}"),
            }

            if self.result_sender.send(RegionResult { rx, rz, biomes }).is_err() {
                break;
            }

        }

    }

}
