// Linear volume <-> decibel gain conversion

/// Convert a linear volume in [0.0, 1.0] to decibels.
///
/// Zero (and anything that would land below `min_db`) maps to `min_db`
/// instead of negative infinity.
pub fn volume_to_db(volume: f32, min_db: f32) -> f32 {
    if volume <= 0.0 {
        return min_db;
    }
    (20.0 * volume.log10()).max(min_db)
}

/// Convert decibels back to a linear amplitude multiplier.
/// `min_db` and below are silence.
pub fn db_to_amplitude(db: f32, min_db: f32) -> f32 {
    if db <= min_db {
        0.0
    } else {
        10.0_f32.powf(db / 20.0)
    }
}

/// Whether `volume` is a valid logical volume (NaN is not)
pub fn is_valid_volume(volume: f32) -> bool {
    (0.0..=1.0).contains(&volume)
}
