//! Trap occupancy tracked as watermarks.
//!
//! The pixel volume is cut into horizontal layers, bottom first. Each layer
//! records the fraction of every species' traps inside it that hold an
//! electron. A cloud reaching height `h` captures into the layers below `h`;
//! release decays every layer by the same per-species factor.

/// Layers whose fills differ by less than this are merged.
const MERGE_TOLERANCE: f64 = 1e-10;
/// Heights closer than this are treated as the same boundary.
const HEIGHT_TOLERANCE: f64 = 1e-14;

#[derive(Debug, Clone)]
struct Layer {
    volume: f64,
    fills: Vec<f64>,
}

/// Occupancy of the traps one charge packet sequence passes over.
///
/// `weight` is the number of physical transfers the current pixel stands for
/// in an express pass; trap capacity scales with it.
#[derive(Debug, Clone)]
pub(crate) struct TrapState {
    n_species: usize,
    layers: Vec<Layer>,
    weight: f64,
}

impl TrapState {
    pub(crate) fn new(n_species: usize) -> Self {
        Self {
            n_species,
            layers: Vec::new(),
            weight: 0.0,
        }
    }

    /// Empty every trap.
    pub(crate) fn reset(&mut self) {
        self.layers.clear();
        self.weight = 0.0;
    }

    /// Change the number of transfers represented by the next pixel.
    ///
    /// Held electrons are preserved: the extra capacity starts empty.
    pub(crate) fn set_weight(&mut self, weight: f64) {
        debug_assert!(weight >= self.weight, "express weights never shrink within a pass");
        if self.weight > 0.0 && weight != self.weight {
            let ratio = self.weight / weight;
            for layer in &mut self.layers {
                for fill in &mut layer.fills {
                    *fill *= ratio;
                }
            }
        }
        self.weight = weight;
    }

    /// Electrons currently held, for the given per-species densities.
    pub(crate) fn held(&self, densities: &[f64]) -> f64 {
        let mut total = 0.0;
        for layer in &self.layers {
            for (fill, density) in layer.fills.iter().zip(densities) {
                total += self.weight * density * layer.volume * fill;
            }
        }
        total
    }

    /// Release electrons from every layer. `retained[k]` is the fraction of
    /// species `k` electrons still held after the dwell.
    pub(crate) fn release(&mut self, densities: &[f64], retained: &[f64]) -> f64 {
        let mut released = 0.0;
        for layer in &mut self.layers {
            for k in 0..self.n_species {
                let fill = layer.fills[k];
                if fill == 0.0 {
                    continue;
                }
                let kept = fill * retained[k];
                released += self.weight * densities[k] * layer.volume * (fill - kept);
                layer.fills[k] = kept;
            }
        }
        released
    }

    /// Capture from a cloud of `charge` electrons reaching `height`.
    ///
    /// `captured[k]` is the fraction of empty species `k` traps below the
    /// height that capture. The total never exceeds `charge`; when it would,
    /// every capture is scaled down uniformly.
    pub(crate) fn capture(
        &mut self,
        charge: f64,
        height: f64,
        densities: &[f64],
        captured: &[f64],
    ) -> f64 {
        if charge <= 0.0 || height <= 0.0 {
            return 0.0;
        }
        let below = self.split_at(height);

        let mut requested = 0.0;
        for layer in &self.layers[..below] {
            for k in 0..self.n_species {
                let empty = 1.0 - layer.fills[k];
                requested += self.weight * densities[k] * layer.volume * empty * captured[k];
            }
        }
        if requested <= 0.0 {
            self.merge();
            return 0.0;
        }

        let scale = (charge / requested).min(1.0);
        for layer in &mut self.layers[..below] {
            for k in 0..self.n_species {
                let fill = layer.fills[k];
                layer.fills[k] = fill + scale * captured[k] * (1.0 - fill);
            }
        }
        self.merge();
        requested * scale
    }

    /// Make sure a layer boundary sits at `height`; returns the number of
    /// layers below it.
    fn split_at(&mut self, height: f64) -> usize {
        let mut bottom = 0.0;
        for i in 0..self.layers.len() {
            let top = bottom + self.layers[i].volume;
            if (top - height).abs() <= HEIGHT_TOLERANCE {
                return i + 1;
            }
            if top > height {
                let upper = Layer {
                    volume: top - height,
                    fills: self.layers[i].fills.clone(),
                };
                self.layers[i].volume = height - bottom;
                self.layers.insert(i + 1, upper);
                return i + 1;
            }
            bottom = top;
        }
        if height - bottom > HEIGHT_TOLERANCE {
            self.layers.push(Layer {
                volume: height - bottom,
                fills: vec![0.0; self.n_species],
            });
        }
        self.layers.len()
    }

    /// Merge neighbouring layers with matching fills and drop empty layers
    /// at the top. Merged fills are volume weighted, so no charge moves.
    fn merge(&mut self) {
        let mut merged: Vec<Layer> = Vec::with_capacity(self.layers.len());
        for layer in self.layers.drain(..) {
            if let Some(last) = merged.last_mut() {
                let same = last
                    .fills
                    .iter()
                    .zip(&layer.fills)
                    .all(|(a, b)| (a - b).abs() < MERGE_TOLERANCE);
                if same {
                    let volume = last.volume + layer.volume;
                    for (a, b) in last.fills.iter_mut().zip(&layer.fills) {
                        *a = (*a * last.volume + b * layer.volume) / volume;
                    }
                    last.volume = volume;
                    continue;
                }
            }
            merged.push(layer);
        }
        while merged
            .last()
            .is_some_and(|layer| layer.fills.iter().all(|&f| f == 0.0))
        {
            merged.pop();
        }
        self.layers = merged;
    }
}
