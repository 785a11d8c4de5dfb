/////////////////////////////////////////////////////////////////////////////////////////////
//
// Example gridding of synthetic air temperature observations over Texas with a blocked mean
// and biharmonic spline chain, validated on a held-out set and masked by distance.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use faer::Mat;
use ferreus_grid::{
    distance_mask, generate_random_points, get_region, project_coordinates, train_test_split,
    BlockReduce, Chain, Estimator, GridSpec, Reduction, Region, ScatteredData, Spline,
    progress::{closure_sink, ProgressMsg},
};

const EARTH_RADIUS: f64 = 6_378_137.0;

/// Spherical Mercator with true scale at `lat_ts` degrees.
fn mercator(lat_ts: f64) -> impl Fn(f64, f64) -> (f64, f64) + Send + Sync + Copy + 'static {
    let k = lat_ts.to_radians().cos();
    move |lon: f64, lat: f64| {
        let x = EARTH_RADIUS * k * lon.to_radians();
        let y = EARTH_RADIUS * k * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
        (x, y)
    }
}

/// Smooth synthetic temperature field: warmer to the south-east.
fn air_temperature(lon: f64, lat: f64) -> f64 {
    28.0 - 0.9 * (lat - 25.0) + 0.25 * (lon + 107.0) + 1.5 * (0.6 * lon).sin() * (0.8 * lat).cos()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Scattered weather stations over Texas in geographic coordinates
    let texas = Region::new(-106.6, -93.5, 25.8, 36.5)?;
    let lonlat = generate_random_points(1500, &texas, Some(42));
    let temperature = Mat::from_fn(lonlat.nrows(), 1, |i, _| {
        air_temperature(lonlat[(i, 0)], lonlat[(i, 1)])
    });
    let region = get_region(lonlat.as_ref())?;

    // Use a Mercator projection for the Cartesian gridder
    let mean_lat = (0..lonlat.nrows()).map(|i| lonlat[(i, 1)]).sum::<f64>() / lonlat.nrows() as f64;
    let projection = mercator(mean_lat);

    // The output grid spacing will be 15 arc-minutes
    let spacing = 15.0 / 60.0;

    let (sink, listener) = closure_sink(64, |msg| match msg {
        ProgressMsg::ForcePointsMerged { num_merged } => {
            println!("Merged {:>3} force points", num_merged)
        }
        ProgressMsg::SystemAssembled { nrows, ncols } => {
            println!("Solving a {} x {} spline system", nrows, ncols)
        }
        _ => {}
    });

    // A blocked mean followed by a lightly damped spline. The minimum distance
    // keeps force points apart to avoid singularities.
    let mut chain = Chain::new(vec![
        (
            "mean".to_string(),
            Box::new(BlockReduce::new(Reduction::mean(), spacing * 111e3)) as Box<dyn Estimator>,
        ),
        (
            "spline".to_string(),
            Box::new(
                Spline::builder()
                    .damping(1e-10)
                    .mindist(100e3)
                    .progress_callback(sink)
                    .build()?,
            ) as Box<dyn Estimator>,
        ),
    ])?;
    println!("{}", chain);

    // Split into training and testing sets in projected coordinates
    let projected = project_coordinates(lonlat.as_ref(), &projection);
    let data = ScatteredData::new(projected, temperature, None)?;
    let (train, test) = train_test_split(&data, 0.25, Some(0))?;

    chain.fit(&train)?;

    // R² on the held-out stations, 1 is a perfect prediction
    let score = chain.score(&test)?;
    println!("\nScore: {:.3}", score);

    // Geographic grid of temperature, masked where stations are far away
    let grid_full = chain.grid(
        &GridSpec::new(spacing)
            .region(region)
            .projection(projection)
            .dims("latitude", "longitude")
            .data_names(vec!["temperature".to_string()]),
    )?;
    let grid = distance_mask(
        lonlat.as_ref(),
        3.0 * spacing * 111e3,
        grid_full,
        Some(&projection),
    )?;

    let (rows, cols) = grid.shape();
    println!(
        "Grid {} x {} ({} x {}), {} nodes masked",
        rows,
        cols,
        grid.dims()[0],
        grid.dims()[1],
        grid.num_masked()
    );

    if let Some(values) = grid.variable("temperature") {
        let (min, max) = (0..rows)
            .flat_map(|i| (0..cols).map(move |j| (i, j)))
            .map(|(i, j)| values[(i, j)])
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        println!("Temperature range: {:.2} to {:.2} C", min, max);
    }

    drop(chain);
    let _ = listener.join();

    Ok(())
}
