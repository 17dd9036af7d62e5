use std::path::Path;
use std::sync::Arc;

use shared::{
    bail,
    ensure,
    Result,
};

use crate::topology::Topology;
use crate::trajectory::{FrameReader, Trajectory};


/// Iterator over the chunks of one trajectory file.
///
/// Frames are read lazily, so only one chunk is held in memory at a time. After the first error
/// the iterator is exhausted.
pub struct IterLoad {
    reader:   Box<dyn FrameReader>,
    topology: Arc<Topology>,
    stride:   usize,
    chunk:    usize,
    /// Index in the file of the next frame to read.
    iframe:   usize,
    done:     bool,
}


impl IterLoad {
    pub fn new(reader: Box<dyn FrameReader>, top: Option<Arc<Topology>>, stride: usize, chunk: usize) -> Result<Self> {
        ensure!(stride >= 1, "Stride must be at least 1, got {}.", stride);

        let topology = match top {
            Some(top) => {
                ensure!(top.natoms() == reader.natoms(),
                    "Topology has {} atoms, but the trajectory has {}.", top.natoms(), reader.natoms());
                top
            },
            None => match reader.topology() {
                Some(top) => Arc::new(top.clone()),
                None => bail!("The trajectory carries no topology, topology required."),
            },
        };

        Ok(Self {
            reader,
            topology,
            stride,
            chunk,
            iframe: 0,
            done: false,
        })
    }

    pub fn topology(&self) -> &Arc<Topology> { &self.topology }

    fn read_chunk(&mut self) -> Result<Option<Trajectory>> {
        let mut frames  = vec![];
        let mut indices = vec![];

        while self.chunk == 0 || frames.len() < self.chunk {
            let Some(frame) = self.reader.read_frame()? else {
                self.done = true;
                break;
            };
            let iframe = self.iframe;
            self.iframe += 1;
            if iframe % self.stride == 0 {
                frames.push(frame);
                indices.push(iframe);
            }
        }

        if frames.is_empty() {
            return Ok(None);
        }
        Trajectory::from_frames(&frames, &indices, self.topology.clone()).map(Some)
    }
}


impl Iterator for IterLoad {
    type Item = Result<Trajectory>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_chunk() {
            Ok(Some(traj)) => Some(Ok(traj)),
            Ok(None) => {
                self.done = true;
                None
            },
            Err(e) => {
                self.done = true;
                Some(Err(e))
            },
        }
    }
}


/// Stream `path` in chunks of `chunk` frames (after striding), `chunk == 0` for the whole file
/// at once. `top` overrides the topology stored in the file, and is mandatory for XTC.
pub fn iterload<P: AsRef<Path>>(path: P, top: Option<Arc<Topology>>, stride: usize, chunk: usize) -> Result<IterLoad> {
    let reader = crate::open_reader(path)?;
    IterLoad::new(reader, top, stride, chunk)
}
