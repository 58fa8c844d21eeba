//! Permutation-table Perlin noise, the coherent primitive summed into octaves by
//! [`NoiseField`](crate::field::NoiseField).

use glam::DVec3;

use super::JavaRandom;


/// A single 3D Perlin noise generator.
#[derive(Debug, Clone)]
pub struct PerlinNoise {
    /// All permutations used by Perlin noise algorithm, duplicated to avoid wrapping.
    permutations: Box<[u16; 512]>,
    /// Offset applied to all position given to the generator.
    offset: DVec3,
}

impl PerlinNoise {

    /// Create a new perlin noise initialized with the given RNG.
    pub fn new(rand: &mut JavaRandom) -> Self {

        let offset = rand.next_dvec3() * 256.0;
        let mut permutations = Box::new(std::array::from_fn::<u16, 512, _>(|i| {
            if i < 256 {
                i as u16
            } else {
                0
            }
        }));

        for index in 0usize..256 {
            let permutation_index = rand.next_int_bounded(256 - index as i32) as usize + index;
            permutations.swap(index, permutation_index);
            permutations[index + 256] = permutations[index];
        }

        Self {
            permutations,
            offset,
        }

    }

    /// Get the noise value at given 3D coordinates, roughly in `[-1, 1]`.
    pub fn sample(&self, pos: DVec3) -> f64 {

        let mut pos = pos + self.offset;
        let pos_floor = pos.floor();
        pos -= pos_floor;
        let factor = pos * pos * pos * (pos * (pos * 6.0 - 15.0) + 10.0);

        // Large coordinates are wrapped through i64 to avoid saturating the cast.
        let x_index = ((pos_floor.x as i64) & 255) as usize;
        let y_index = ((pos_floor.y as i64) & 255) as usize;
        let z_index = ((pos_floor.z as i64) & 255) as usize;

        let a = self.permutations[x_index] as usize + y_index;
        let a0 = self.permutations[a] as usize + z_index;
        let a1 = self.permutations[a + 1] as usize + z_index;
        let b = self.permutations[x_index + 1] as usize + y_index;
        let b0 = self.permutations[b] as usize + z_index;
        let b1 = self.permutations[b + 1] as usize + z_index;

        lerp(factor.z,
            lerp(factor.y,
                lerp(factor.x,
                    grad(self.permutations[a0], pos),
                    grad(self.permutations[b0], pos - DVec3::new(1.0, 0.0, 0.0))),
                lerp(factor.x,
                    grad(self.permutations[a1], pos - DVec3::new(0.0, 1.0, 0.0)),
                    grad(self.permutations[b1], pos - DVec3::new(1.0, 1.0, 0.0)))),
            lerp(factor.y,
                lerp(factor.x,
                    grad(self.permutations[a0 + 1], pos - DVec3::new(0.0, 0.0, 1.0)),
                    grad(self.permutations[b0 + 1], pos - DVec3::new(1.0, 0.0, 1.0))),
                lerp(factor.x,
                    grad(self.permutations[a1 + 1], pos - DVec3::new(0.0, 1.0, 1.0)),
                    grad(self.permutations[b1 + 1], pos - DVec3::new(1.0, 1.0, 1.0)))))

    }

}

#[inline]
fn lerp(factor: f64, from: f64, to: f64) -> f64 {
    from + factor * (to - from)
}

#[inline]
fn grad(value: u16, pos: DVec3) -> f64 {
    let value = value & 15;
    let a = if value < 8 { pos.x } else { pos.y };
    let b = if value < 4 { pos.y } else if value != 12 && value != 14 { pos.z } else { pos.x };
    (if value & 1 == 0 { a } else { -a }) + (if value & 2 == 0 { b } else { -b })
}
