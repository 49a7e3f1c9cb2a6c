//! Animated texture unrolling.
//!
//! Each animated texture bound by a model plays a frame sequence, one entry
//! per game tick. The sequences of all textures repeat together after the
//! least common multiple of their lengths; that period is cut into keyframes
//! that each bind every animated variable to a single image.

use crate::mesher::TextureSource;
use crate::resolver::resolve_texture_ref;
use crate::resource_pack::{Model, TextureData, TextureRef};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// One step of an unrolled animation.
#[derive(Debug, Clone)]
pub struct Keyframe {
    /// First tick covered by this keyframe.
    pub tick: u32,
    /// Length in ticks.
    pub duration: u32,
    /// `(model index, texture variable)` to the image drawn for it.
    pub bindings: BTreeMap<(usize, String), Arc<TextureData>>,
    indices: Vec<u32>,
}

impl Keyframe {
    /// Copy of `model` with this keyframe's images bound to its variables.
    pub fn apply(&self, model_index: usize, model: &Model) -> Model {
        let mut model = model.clone();
        for ((index, variable), image) in &self.bindings {
            if *index == model_index {
                model
                    .textures
                    .insert(variable.clone(), TextureRef::Image(image.clone()));
            }
        }
        model
    }
}

/// Frame index for every tick of one loop of a texture's animation.
pub fn frame_sequence(texture: &TextureData) -> Vec<u32> {
    let Some(meta) = &texture.animation else {
        return vec![0];
    };
    let frametime = meta.frametime.max(1);
    let mut sequence = Vec::new();
    match &meta.frames {
        Some(frames) if !frames.is_empty() => {
            for frame in frames {
                let time = frame.time(frametime).max(1);
                sequence.extend(std::iter::repeat(frame.index()).take(time as usize));
            }
        }
        _ => {
            for index in 0..texture.frame_count() {
                sequence.extend(std::iter::repeat(index).take(frametime as usize));
            }
        }
    }
    sequence
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

fn lcm(a: usize, b: usize) -> usize {
    (a / gcd(a, b)).saturating_mul(b)
}

/// Longest unrolled period, in ticks (five minutes of game time).
pub const MAX_ANIMATION_TICKS: usize = 6000;

struct Track {
    model: usize,
    variable: String,
    texture: Arc<TextureData>,
    sequence: Vec<u32>,
    interpolate: bool,
}

impl Track {
    fn index_at(&self, tick: usize) -> u32 {
        self.sequence[tick % self.sequence.len()]
    }

    /// Blend target and weight at `tick`: the next distinct frame and how far
    /// through the current run of equal frames the tick lies.
    fn blend_at(&self, tick: usize) -> Option<(u32, f32)> {
        let n = self.sequence.len();
        let current = self.index_at(tick);
        let after = (1..=n).find(|k| self.index_at(tick + k) != current)?;
        let before = (1..n)
            .take_while(|k| self.index_at(tick + n - k) == current)
            .count();
        if before == 0 {
            return None;
        }
        let t = before as f32 / (before + after) as f32;
        Some((self.index_at(tick + after), t))
    }
}

/// Expands the animated textures of a set of models into keyframes.
pub struct AnimationUnroller<'a> {
    textures: &'a TextureSource<'a>,
}

impl<'a> AnimationUnroller<'a> {
    pub fn new(textures: &'a TextureSource<'a>) -> Self {
        Self { textures }
    }

    fn tracks(&self, models: &[&Model]) -> Vec<Track> {
        let mut tracks = Vec::new();
        for (model_index, model) in models.iter().enumerate() {
            for variable in model.textures.keys() {
                let Some(TextureRef::Key(key)) = resolve_texture_ref(model, &format!("#{}", variable)) else {
                    continue;
                };
                let Some(texture) = self.textures.raw(&key) else {
                    continue;
                };
                if !texture.is_animated() {
                    continue;
                }
                tracks.push(Track {
                    model: model_index,
                    variable: variable.clone(),
                    sequence: frame_sequence(texture),
                    interpolate: texture.animation.as_ref().map(|a| a.interpolate).unwrap_or(false),
                    texture: texture.clone(),
                });
            }
        }
        tracks
    }

    /// Keyframes in tick order. Durations sum to the common period, cut
    /// off at `MAX_ANIMATION_TICKS`. Without
    /// interpolation, consecutive ticks with identical frames are merged;
    /// with it, every tick is its own keyframe.
    pub fn unroll(&self, models: &[&Model]) -> Vec<Keyframe> {
        let tracks = self.tracks(models);
        let full_period = tracks
            .iter()
            .map(|t| t.sequence.len())
            .fold(1, lcm);
        let period = full_period.min(MAX_ANIMATION_TICKS);
        if period < full_period {
            tracing::warn!(
                "animation period of {} ticks truncated to {}",
                full_period,
                MAX_ANIMATION_TICKS
            );
        }
        let interpolated = tracks.iter().any(|t| t.interpolate);
        if !tracks.is_empty() {
            tracing::debug!(
                "unrolling {} animated textures over {} ticks",
                tracks.len(),
                period
            );
        }

        let mut frames: HashMap<(usize, u32), Arc<TextureData>> = HashMap::new();
        let mut frame = |track_index: usize, track: &Track, index: u32| {
            frames
                .entry((track_index, index))
                .or_insert_with(|| Arc::new(track.texture.frame(index)))
                .clone()
        };

        let mut keyframes: Vec<Keyframe> = Vec::new();
        for tick in 0..period {
            let indices: Vec<u32> = tracks.iter().map(|t| t.index_at(tick)).collect();
            if !interpolated {
                if let Some(last) = keyframes.last_mut() {
                    if last.indices == indices {
                        last.duration += 1;
                        continue;
                    }
                }
            }

            let mut bindings = BTreeMap::new();
            for (i, track) in tracks.iter().enumerate() {
                let current = frame(i, track, indices[i]);
                let image = match track.interpolate.then(|| track.blend_at(tick)).flatten() {
                    Some((next, t)) => {
                        let next = frame(i, track, next);
                        Arc::new(TextureData::blend(&current, &next, t))
                    }
                    None => current,
                };
                bindings.insert((track.model, track.variable.clone()), image);
            }
            keyframes.push(Keyframe {
                tick: tick as u32,
                duration: 1,
                bindings,
                indices,
            });
        }
        keyframes
    }
}
