//! NeuQuant color quantization.
//!
//! Reduces a packed RGB pixel stream to a 256-entry palette with a Kohonen
//! self-organizing map, following Anthony Dekker's NeuQuant algorithm:
//!
//! 1. **init** - neurons start on an evenly spaced gray ramp.
//! 2. **learn** - sampled pixels pull the winning neuron (and, while the
//!    neighbourhood radius is non-zero, its neighbours) toward their color.
//!    A frequency/bias term keeps rarely chosen neurons competitive.
//! 3. **unbias** - fixed-point positions become 0..=255 integers.
//! 4. **index** - neurons are sorted by green and a green lookup table is
//!    built so queries only scan a bounded window of the network.
//!
//! Training state lives in [`ColorQuantizer`] and is consumed by
//! [`ColorQuantizer::build_colormap`], so a [`ColorMap`] can only be queried
//! after training has run exactly once.
//!
//! Channel order is RGB throughout: the first byte of every pixel is red.

use log::trace;

/// Number of neurons, and therefore palette entries.
pub const NETSIZE: usize = 256;

const MAX_NET_POS: usize = NETSIZE - 1;

/// Number of learning cycles (alpha/radius decay steps).
const NCYCLES: usize = 100;

// Four primes near 500. No image is assumed long enough to be divisible by all four,
// so stepping by one of them visits pixels without early repetition.
const PRIME1: usize = 499;
const PRIME2: usize = 491;
const PRIME3: usize = 487;
const PRIME4: usize = 503;
const MIN_PICTURE_BYTES: usize = 3 * PRIME4;

// Color values are biased by 4 bits during training.
const NET_BIAS_SHIFT: i32 = 4;

// Frequency and bias fixed-point parameters.
const INT_BIAS_SHIFT: i32 = 16;
const INT_BIAS: i32 = 1 << INT_BIAS_SHIFT;
const GAMMA_SHIFT: i32 = 10;
const BETA_SHIFT: i32 = 10;
const BETA: f64 = (INT_BIAS >> BETA_SHIFT) as f64;
const BETA_GAMMA: f64 = (INT_BIAS << (GAMMA_SHIFT - BETA_SHIFT)) as f64;

// Neighbourhood radius starts at 32 (biased by 6 bits) and decays by 1/30 per cycle.
const INIT_RAD: i32 = (NETSIZE >> 3) as i32;
const RADIUS_BIAS_SHIFT: i32 = 6;
const RADIUS_BIAS: i32 = 1 << RADIUS_BIAS_SHIFT;
const INIT_RADIUS: i32 = INIT_RAD * RADIUS_BIAS;
const RADIUS_DEC: f64 = 30.0;

// Learning rate starts at 1.0, biased by 10 bits.
const ALPHA_BIAS_SHIFT: i32 = 10;
const INIT_ALPHA: f64 = (1 << ALPHA_BIAS_SHIFT) as f64;

const RAD_BIAS_SHIFT: i32 = 8;
const RAD_BIAS: i32 = 1 << RAD_BIAS_SHIFT;
const ALPHA_RAD_BIAS: f64 = (1 << (ALPHA_BIAS_SHIFT + RAD_BIAS_SHIFT)) as f64;

/// Self-organizing map trained on one RGB pixel stream.
pub struct ColorQuantizer<'a> {
    pixels: &'a [u8],
    sample_factor: usize,
    /// Neuron positions in biased (x16) color space.
    network: [[f64; 3]; NETSIZE],
    freq: [f64; NETSIZE],
    bias: [f64; NETSIZE],
    radpower: [i32; NETSIZE >> 3],
}

impl<'a> ColorQuantizer<'a> {
    /// Create a quantizer over packed RGB `pixels` (3 bytes per pixel).
    ///
    /// `sample_factor` trades quality for speed: 1 visits every pixel, 10
    /// visits roughly one in ten. Values below 1 are treated as 1. Trailing
    /// bytes that do not form a whole pixel are ignored.
    pub fn new(pixels: &'a [u8], sample_factor: u32) -> Self {
        let whole = pixels.len() - pixels.len() % 3;
        Self {
            pixels: &pixels[..whole],
            sample_factor: sample_factor.max(1) as usize,
            network: [[0.0; 3]; NETSIZE],
            freq: [0.0; NETSIZE],
            bias: [0.0; NETSIZE],
            radpower: [0; NETSIZE >> 3],
        }
    }

    /// Train the network and build the searchable palette.
    pub fn build_colormap(mut self) -> ColorMap {
        self.init();
        self.learn();
        let network = self.unbias();
        ColorMap::index(network)
    }

    fn init(&mut self) {
        for i in 0..NETSIZE {
            let v = ((i << (NET_BIAS_SHIFT + 8)) / NETSIZE) as f64;
            self.network[i] = [v, v, v];
            self.freq[i] = f64::from(INT_BIAS / NETSIZE as i32);
            self.bias[i] = 0.0;
        }
    }

    /// Main learning loop.
    fn learn(&mut self) {
        let length = self.pixels.len();
        let Schedule {
            step,
            sample_pixels,
            delta,
            alphadec,
        } = Schedule::new(length, self.sample_factor);

        let mut alpha = INIT_ALPHA;
        let mut radius = f64::from(INIT_RADIUS);
        let mut rad = neighbourhood(radius);
        self.update_radpower(alpha, rad);

        trace!(
            "NeuQuant learn: {} bytes, step {}, {} samples, delta {}, alphadec {}",
            length, step, sample_pixels, delta, alphadec
        );

        let mut pix = 0;
        for i in 1..=sample_pixels {
            let color = [
                f64::from(i32::from(self.pixels[pix]) << NET_BIAS_SHIFT),
                f64::from(i32::from(self.pixels[pix + 1]) << NET_BIAS_SHIFT),
                f64::from(i32::from(self.pixels[pix + 2]) << NET_BIAS_SHIFT),
            ];

            let winner = self.contest(color);
            self.alter_single(alpha, winner, color);
            if rad > 0 {
                self.alter_neighbours(rad, winner, color);
            }

            pix += step;
            if pix >= length {
                pix -= length;
            }

            if i % delta == 0 {
                alpha -= alpha / alphadec;
                radius -= radius / RADIUS_DEC;
                rad = neighbourhood(radius);
                self.update_radpower(alpha, rad);
            }
        }
    }

    /// Recompute the radially decaying neighbour weights.
    fn update_radpower(&mut self, alpha: f64, rad: usize) {
        let rad_sq = (rad * rad) as f64;
        for (i, power) in self.radpower.iter_mut().take(rad).enumerate() {
            let falloff = ((rad * rad - i * i) as i32 * RAD_BIAS) as f64;
            *power = (alpha * (falloff / rad_sq)) as i32;
        }
    }

    /// Find the best neuron for `color` and update every neuron's frequency and bias.
    ///
    /// The closest neuron (plain distance) has its frequency raised; the returned
    /// neuron minimises distance minus bias, which favours rarely chosen neurons.
    fn contest(&mut self, color: [f64; 3]) -> usize {
        let mut best_d = f64::from(i32::MAX);
        let mut best_bias_d = best_d;
        let mut best_pos = 0;
        let mut best_bias_pos = 0;

        for i in 0..NETSIZE {
            let n = &self.network[i];
            let dist = (n[0] - color[0]).abs() + (n[1] - color[1]).abs() + (n[2] - color[2]).abs();
            if dist < best_d {
                best_d = dist;
                best_pos = i;
            }

            let bias_dist =
                dist - f64::from((self.bias[i] as i32) >> (INT_BIAS_SHIFT - NET_BIAS_SHIFT));
            if bias_dist < best_bias_d {
                best_bias_d = bias_dist;
                best_bias_pos = i;
            }

            let beta_freq = f64::from((self.freq[i] as i32) >> BETA_SHIFT);
            self.freq[i] -= beta_freq;
            self.bias[i] += f64::from((beta_freq as i32) << GAMMA_SHIFT);
        }

        self.freq[best_pos] += BETA;
        self.bias[best_pos] -= BETA_GAMMA;

        best_bias_pos
    }

    /// Move neuron `i` toward `color` by `alpha`.
    fn alter_single(&mut self, alpha: f64, i: usize, color: [f64; 3]) {
        let n = &mut self.network[i];
        for c in 0..3 {
            n[c] -= alpha * (n[c] - color[c]) / INIT_ALPHA;
        }
    }

    /// Move the neurons within `rad` of `i` toward `color`, weighted by `radpower`.
    fn alter_neighbours(&mut self, rad: usize, i: usize, color: [f64; 3]) {
        let center = i as isize;
        let lo = (center - rad as isize).abs();
        let hi = (i + rad).min(NETSIZE) as isize;

        let mut j = center + 1;
        let mut k = center - 1;
        let mut m = 1;

        while j < hi || k > lo {
            let a = f64::from(self.radpower[m]);
            m += 1;

            if j < hi {
                let n = &mut self.network[j as usize];
                for c in 0..3 {
                    n[c] -= a * (n[c] - color[c]) / ALPHA_RAD_BIAS;
                }
                j += 1;
            }

            if k > lo {
                let n = &mut self.network[k as usize];
                for c in 0..3 {
                    n[c] -= a * (n[c] - color[c]) / ALPHA_RAD_BIAS;
                }
                k -= 1;
            }
        }
    }

    /// Convert biased positions to 0..=255 and stamp each neuron with its pre-sort index.
    fn unbias(&self) -> [[i32; 4]; NETSIZE] {
        let round = 1 << (NET_BIAS_SHIFT - 1);
        let mut network = [[0i32; 4]; NETSIZE];
        for (i, (out, n)) in network.iter_mut().zip(self.network.iter()).enumerate() {
            for c in 0..3 {
                out[c] = (((n[c] as i32) + round) >> NET_BIAS_SHIFT).clamp(0, 255);
            }
            out[3] = i as i32;
        }
        network
    }
}

/// Pixel stepping and decay parameters for one training pass.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Schedule {
    /// Byte stride between sampled pixels.
    step: usize,
    sample_pixels: usize,
    /// Samples between alpha/radius decay steps.
    delta: usize,
    alphadec: f64,
}

impl Schedule {
    fn new(length: usize, sample_factor: usize) -> Self {
        // The decay rate follows the requested sample factor even when a small
        // image is sampled in full
        let alphadec = (30 + (sample_factor - 1) / 3) as f64;

        let (step, sample_factor) = if length < MIN_PICTURE_BYTES {
            (3, 1)
        } else if length % PRIME1 != 0 {
            (3 * PRIME1, sample_factor)
        } else if length % PRIME2 != 0 {
            (3 * PRIME2, sample_factor)
        } else if length % PRIME3 != 0 {
            (3 * PRIME3, sample_factor)
        } else {
            (3 * PRIME4, sample_factor)
        };

        let sample_pixels = length / (3 * sample_factor);

        Self {
            step,
            sample_pixels,
            delta: (sample_pixels / NCYCLES).max(1),
            alphadec,
        }
    }
}

/// Neighbourhood radius in neurons; radii of one or less disable neighbour updates.
fn neighbourhood(radius: f64) -> usize {
    let rad = (radius as i32) >> RADIUS_BIAS_SHIFT;
    if rad <= 1 { 0 } else { rad as usize }
}

/// Trained 256-color palette with a green-indexed nearest-color search.
#[derive(Clone)]
pub struct ColorMap {
    /// Neurons sorted by green: `[r, g, b, palette index]`.
    network: [[i32; 4]; NETSIZE],
    /// First sorted position to probe for each green value.
    netindex: [usize; 256],
    /// Palette in output order, 3 bytes per entry.
    palette: [u8; NETSIZE * 3],
}

impl ColorMap {
    /// Sort `network` by green and build the green lookup table.
    fn index(mut network: [[i32; 4]; NETSIZE]) -> Self {
        let mut palette = [0u8; NETSIZE * 3];
        for n in &network {
            let at = n[3] as usize * 3;
            palette[at] = n[0] as u8;
            palette[at + 1] = n[1] as u8;
            palette[at + 2] = n[2] as u8;
        }

        let mut netindex = [0usize; 256];
        let mut previous_col = 0usize;
        let mut start_pos = 0usize;

        for i in 0..NETSIZE {
            // Selection sort on green
            let mut small_pos = i;
            let mut small_val = network[i][1];
            for (j, n) in network.iter().enumerate().skip(i + 1) {
                if n[1] < small_val {
                    small_pos = j;
                    small_val = n[1];
                }
            }
            if i != small_pos {
                network.swap(i, small_pos);
            }

            let small_val = small_val as usize;
            if small_val != previous_col {
                netindex[previous_col] = (start_pos + i) >> 1;
                for entry in &mut netindex[previous_col + 1..small_val] {
                    *entry = i;
                }
                previous_col = small_val;
                start_pos = i;
            }
        }

        netindex[previous_col] = (start_pos + MAX_NET_POS) >> 1;
        for entry in &mut netindex[previous_col + 1..] {
            *entry = MAX_NET_POS;
        }

        Self {
            network,
            netindex,
            palette,
        }
    }

    /// The palette as packed RGB, exactly 256 entries.
    pub fn palette(&self) -> &[u8; NETSIZE * 3] {
        &self.palette
    }

    /// Palette entry `index` as `[r, g, b]`.
    pub fn color(&self, index: u8) -> [u8; 3] {
        let at = index as usize * 3;
        [self.palette[at], self.palette[at + 1], self.palette[at + 2]]
    }

    /// Palette index of the entry nearest to `(r, g, b)` by Manhattan distance.
    ///
    /// Searches outward from the green lookup position in both directions and stops
    /// each direction once the green difference alone reaches the best distance.
    pub fn lookup_rgb(&self, r: u8, g: u8, b: u8) -> u8 {
        let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));

        // Largest possible distance is 255 * 3
        let mut best_d = 1000;
        let mut best = 0;

        let mut i = self.netindex[g as usize];
        let mut j = i as isize - 1;

        while i < NETSIZE || j >= 0 {
            if i < NETSIZE {
                let p = &self.network[i];
                let dist = p[1] - g;
                if dist >= best_d {
                    i = NETSIZE;
                } else {
                    i += 1;
                    let mut dist = dist.abs() + (p[0] - r).abs();
                    if dist < best_d {
                        dist += (p[2] - b).abs();
                        if dist < best_d {
                            best_d = dist;
                            best = p[3];
                        }
                    }
                }
            }

            if j >= 0 {
                let p = &self.network[j as usize];
                let dist = g - p[1];
                if dist >= best_d {
                    j = -1;
                } else {
                    j -= 1;
                    let mut dist = dist.abs() + (p[0] - r).abs();
                    if dist < best_d {
                        dist += (p[2] - b).abs();
                        if dist < best_d {
                            best_d = dist;
                            best = p[3];
                        }
                    }
                }
            }
        }

        best as u8
    }

    /// Exhaustive nearest-color scan, for checking the pruned search.
    #[cfg(test)]
    fn lookup_exhaustive(&self, r: u8, g: u8, b: u8) -> u8 {
        let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
        self.network
            .iter()
            .min_by_key(|p| (p[0] - r).abs() + (p[1] - g).abs() + (p[2] - b).abs())
            .map(|p| p[3] as u8)
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for ColorMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorMap").field("entries", &NETSIZE).finish()
    }
}
