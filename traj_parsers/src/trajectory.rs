use std::sync::Arc;

use shared::{
    ensure,
    ndarray as nd,
    geometry::Cell,
    Mat33,
    MatX3,
    Result,
    Vec3,
};

use crate::topology::Topology;


/// One frame as it comes out of a reader, coordinates and cell in nanometres.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    /// Time in picoseconds.
    pub time:      Option<f32>,
    pub positions: MatX3<f32>,
    /// Box vectors as rows.
    pub cell:      Option<Mat33<f32>>,
}


impl Frame {
    pub fn natoms(&self) -> usize { self.positions.len() }
}


/// Streaming access to the frames of one trajectory file.
pub trait FrameReader {
    /// Number of atoms in every frame.
    fn natoms(&self) -> usize;

    /// Topology carried by the file itself, if the format has one.
    fn topology(&self) -> Option<&Topology>;

    /// Reads the next frame, `Ok(None)` at the end of the file.
    fn read_frame(&mut self) -> Result<Option<Frame>>;
}


/// A block of consecutive (possibly strided) frames sharing one topology.
#[derive(Clone, Debug)]
pub struct Trajectory {
    /// `(nframes, natoms, 3)` in nanometres.
    pub xyz:      nd::Array3<f32>,
    /// `(nframes,)` in picoseconds.
    pub time:     nd::Array1<f32>,
    /// `(nframes, 3, 3)` box vectors as rows, present only if every frame has a non-degenerate box.
    pub unitcell: Option<nd::Array3<f32>>,
    pub topology: Arc<Topology>,
}


impl Trajectory {
    /// `indices` are the positions of the frames in their file, used as time for formats without
    /// a time stamp.
    pub fn from_frames(frames: &[Frame], indices: &[usize], topology: Arc<Topology>) -> Result<Self> {
        ensure!(frames.len() == indices.len(), "Number of frames and frame indices mismatch.");

        let nframes = frames.len();
        let natoms  = topology.natoms();

        let mut xyz = nd::Array3::<f32>::zeros((nframes, natoms, 3));
        for (iframe, frame) in frames.iter().enumerate() {
            ensure!(frame.natoms() == natoms,
                "Frame {} has {} atoms while the topology has {}.", indices[iframe], frame.natoms(), natoms);
            for (iatom, pos) in frame.positions.iter().enumerate() {
                for k in 0 .. 3 {
                    xyz[[iframe, iatom, k]] = pos[k];
                }
            }
        }

        let time = frames.iter().zip(indices.iter())
            .map(|(f, &i)| f.time.unwrap_or(i as f32))
            .collect::<nd::Array1<f32>>();

        let has_cell = nframes > 0 && frames.iter().all(|f| {
            f.cell.map_or(false, |c| Cell::new(to_f64(&c)).is_some())
        });
        let unitcell = if has_cell {
            let mut cells = nd::Array3::<f32>::zeros((nframes, 3, 3));
            for (iframe, frame) in frames.iter().enumerate() {
                if let Some(c) = frame.cell {
                    for i in 0 .. 3 {
                        for j in 0 .. 3 {
                            cells[[iframe, i, j]] = c[i][j];
                        }
                    }
                }
            }
            Some(cells)
        } else {
            None
        };

        Ok(Self { xyz, time, unitcell, topology })
    }

    pub fn nframes(&self) -> usize { self.xyz.shape()[0] }
    pub fn natoms(&self) -> usize { self.xyz.shape()[1] }

    pub fn position(&self, iframe: usize, iatom: usize) -> Vec3<f64> {
        [
            self.xyz[[iframe, iatom, 0]] as f64,
            self.xyz[[iframe, iatom, 1]] as f64,
            self.xyz[[iframe, iatom, 2]] as f64,
        ]
    }

    pub fn positions(&self, iframe: usize, indices: &[usize]) -> Vec<Vec3<f64>> {
        indices.iter().map(|&i| self.position(iframe, i)).collect()
    }

    pub fn cell(&self, iframe: usize) -> Option<Cell> {
        let cells = self.unitcell.as_ref()?;
        let mut m = [[0.0f64; 3]; 3];
        for i in 0 .. 3 {
            for j in 0 .. 3 {
                m[i][j] = cells[[iframe, i, j]] as f64;
            }
        }
        Cell::new(m)
    }
}


fn to_f64(m: &Mat33<f32>) -> Mat33<f64> {
    m.map(|row| row.map(|v| v as f64))
}
