use chrono::{Duration, Utc};
use tracing::info;

use super::ledger::SeatLedger;

const MOVIES: [&str; 4] = [
    "The Dark Knight",
    "Inception",
    "The Matrix",
    "Interstellar",
];

/// Daily start hours for the demo schedule.
const START_HOURS: [u32; 4] = [10, 13, 16, 19];

/// Seeds a week of demo screenings (4 per day) with `seats_per_screening`
/// seats each. Skipped when the ledger already has screenings, so a warm
/// restart does not duplicate the schedule. Returns the number created.
pub fn seed_screenings(ledger: &SeatLedger, seats_per_screening: u32) -> usize {
    if ledger.screening_count() > 0 {
        info!("screenings already present, skipping seeding");
        return 0;
    }

    let today = Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc();

    let mut created = 0;
    for day in 0..7 {
        for (i, &hour) in START_HOURS.iter().enumerate() {
            let movie = MOVIES[(day + i) % MOVIES.len()];
            let starts_at = today + Duration::days(day as i64) + Duration::hours(hour as i64);
            ledger.add_screening(movie, starts_at, seats_per_screening);
            created += 1;
        }
    }

    info!(created, seats_per_screening, "seeded demo screenings");
    created
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_a_week_of_screenings_once() {
        let ledger = SeatLedger::new();
        assert_eq!(seed_screenings(&ledger, 50), 28);
        assert_eq!(ledger.screening_count(), 28);

        // Already-populated ledgers are left alone.
        assert_eq!(seed_screenings(&ledger, 50), 0);
        assert_eq!(ledger.screening_count(), 28);
    }

    #[test]
    fn seeded_screenings_have_full_seat_pools() {
        let ledger = SeatLedger::new();
        seed_screenings(&ledger, 50);

        let screening = &ledger.list_screenings()[0];
        assert_eq!(screening.seat_count, 50);
        assert!(ledger.snapshot_occupied(screening.id).unwrap().is_empty());
    }
}
