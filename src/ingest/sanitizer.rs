use crate::ingest::models::RawReading;

/// Out-of-range code station files use for "instrument reported nothing"
pub const SENTINEL_MISSING: i32 = -9999;

/// Map the sentinel code to an absent value; everything else passes through.
pub fn sanitize_value(value: Option<i32>) -> Option<i32> {
    value.filter(|v| *v != SENTINEL_MISSING)
}

/// Replace sentinel codes with `None` in place.
///
/// No reading is dropped. Returns how many values were nulled.
pub fn sanitize(readings: &mut [RawReading]) -> usize {
    let mut nulled = 0;

    for reading in readings.iter_mut() {
        for field in [&mut reading.tmax, &mut reading.tmin, &mut reading.precip] {
            let clean = sanitize_value(*field);
            if clean != *field {
                nulled += 1;
                *field = clean;
            }
        }
    }

    nulled
}
