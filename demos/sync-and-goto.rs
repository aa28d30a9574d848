//! Syncs a slightly misaligned alt-az mount on a handful of bright stars, then works out where to
//! point it for a few more.
//!
//! Run with `RUST_LOG=skyalign=debug` to see which model the engine settles on, or with
//! `RUST_LOG=skyalign=trace` to also see every matrix it computes.

use skyalign::geographic::Components;
use skyalign::transform::BasisChange;
use skyalign::{
    Actual, AlignmentEngine, Apparent, CalibrationEntry, DirectionVector, Equatorial,
    EquatorialComponents, FixedClock, GeographicPosition, Horizontal, InMemoryDatabase,
    JulianDate, MountAlignment,
};
use tracing_subscriber::EnvFilter;
use uom::si::f64::{Angle, Length};
use uom::si::{angle::degree, length::meter};

fn radec(ra: f64, dec: f64) -> Equatorial {
    Equatorial::build(EquatorialComponents {
        right_ascension: Angle::new::<degree>(ra),
        declination: Angle::new::<degree>(dec),
    })
    .expect("declination is in [-90, 90]")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let observatory = GeographicPosition::build(Components {
        latitude: Angle::new::<degree>(52.),
        longitude: Angle::new::<degree>(4.5),
        elevation: Length::new::<meter>(10.),
    })
    .expect("latitude is in [-90, 90]");
    let now = JulianDate(2_460_000.25);

    // The mount's azimuth axis leans a little towards the east, which we pretend not to know.
    let lean = BasisChange::<Actual, Apparent>::new(
        [
            DirectionVector::new(1., 0., 0.),
            DirectionVector::new(0., 1., 0.),
            DirectionVector::new(0., 0., 1.),
        ],
        [
            DirectionVector::new(0.9998, 0., -0.02),
            DirectionVector::new(0., 1., 0.),
            DirectionVector::new(0.02, 0., 0.9998),
        ],
    )
    .forward()?;
    let where_the_mount_says = |star: &Equatorial| -> DirectionVector<Apparent> {
        let horizontal = skyalign::conversion::equatorial_to_horizontal(star, &observatory, now);
        (horizontal.to_direction::<Actual>() * lean).normalized()
    };

    let mut database = InMemoryDatabase::with_reference_position(observatory);
    let stars = [
        ("Vega", radec(279.2347, 38.7837)),
        ("Capella", radec(79.1723, 45.9980)),
        ("Arcturus", radec(213.9153, 19.1824)),
        ("Dubhe", radec(165.9320, 61.7510)),
        ("Deneb", radec(310.3580, 45.2803)),
    ];
    for (name, star) in &stars {
        if database.contains_near(star, Angle::new::<degree>(0.5)) {
            println!("already synced near {name}, skipping");
            continue;
        }
        database.push(CalibrationEntry {
            celestial: *star,
            observation: now,
            apparent: where_the_mount_says(star),
        });
    }

    let mut engine = AlignmentEngine::with_clock(MountAlignment::Zenith, FixedClock(now));
    engine.initialise(&database)?;
    println!(
        "{:?} model from {} sync points",
        engine.model_kind(),
        engine.sync_point_count().unwrap_or_default()
    );

    for (name, target) in [
        ("Polaris", radec(37.9546, 89.2641)),
        ("Mizar", radec(200.9814, 54.9254)),
        ("Altair", radec(297.6958, 8.8683)),
    ] {
        let apparent = engine.transform_celestial_to_telescope(&target, 0.)?;
        let expected = where_the_mount_says(&target);
        let pointing = Horizontal::from_direction(&apparent);
        println!(
            "{name} ({target}): point the mount at {pointing}, off by {:.2e}",
            (apparent - expected).length()
        );
        let back = engine.transform_telescope_to_celestial(&apparent)?;
        println!("  and back: {back}");
    }

    Ok(())
}
