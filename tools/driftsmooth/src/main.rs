use std::f64::consts::PI;

use anyhow::{Context, Result, ensure};
use driftlap::prelude::*;

mod config;

use config::{Config, Problem};

fn main() -> Result<()> {
    // Load configuration
    let config::Invocation { config, export } = config::configure()?;

    // Build enviornment logger.
    env_logger::builder()
        .filter_level(config.solver.logging.filter())
        .init();

    log::info!("Run name: {}", &config.name);
    log::info!("Logging Level: {} ", config.solver.logging.level);

    if let Some(path) = &export {
        config
            .solver
            .export_to_toml(path)
            .context(format!("Failed to write {}", path.display()))?;
        log::info!("Wrote solver parameters to {}", path.display());
    }

    let problem = &config.problem;

    ensure!(
        problem.cells >= 2 && problem.length > 0.0,
        "Domain must have at least two cells and a positive length"
    );
    ensure!(
        problem.drift.is_empty() || problem.drift.len() == problem.dimension,
        "Drift must have one entry per axis"
    );

    match problem.dimension {
        2 => run::<2>(&config),
        3 => run::<3>(&config),
        dim => Err(anyhow::anyhow!("Unsupported dimension {dim}, expected 2 or 3")),
    }
}

fn run<const N: usize>(config: &Config) -> Result<()> {
    let problem = &config.problem;
    let solver = &config.solver;

    let region = IndexBox::from_size([0; N], [problem.cells; N]);
    let dxinv = [problem.cells as f64 / problem.length; N];

    log::info!(
        "Patch {:?} with spacing {:.5e}",
        region.size(),
        problem.length / problem.cells as f64
    );

    let mut a: Field<N> = Field::new(region, 1, 1);
    a.fill(problem.reaction);

    let b: [Field<N>; N] = std::array::from_fn(|axis| {
        let mut field: Field<N> = Field::faces(region, axis, 0, 1);
        field.fill(problem.diffusion);
        field
    });
    let c: [Field<N>; N] = std::array::from_fn(|axis| {
        let mut field: Field<N> = Field::faces(region, axis, 0, 1);
        field.fill(problem.drift.get(axis).copied().unwrap_or(0.0));
        field
    });

    let mask = overset_mask(problem, region)?;

    if let Some(mask) = &mask {
        check_coarse_level(config, region, mask)?;
    }

    let op = Operator::new(
        Coefficients {
            a: &a,
            b: std::array::from_fn(|axis| &b[axis]),
            c: std::array::from_fn(|axis| &c[axis]),
        },
        solver.operator,
        dxinv,
    );

    let report = op.check_diagonal_dominance(region, solver.dominance)?;
    log::info!(
        "Diagonal dominance: {} violations in {} cells (worst ratio {:.3})",
        report.violations,
        report.checked,
        report.worst_ratio
    );

    let mut rhs: Field<N> = Field::new(region, 0, 1);
    rhs.fill_with(region, |cell, _| {
        cell.iter()
            .map(|&i| (PI * (i as f64 + 0.5) / problem.cells as f64).sin())
            .product()
    });

    let mut phi: Field<N> = Field::new(region, 1, 1);

    log::info!(
        "Running {} sweeps with omega = {}",
        solver.relax.sweeps,
        solver.relax.omega
    );

    let history = op.smooth(
        region,
        region,
        &mut phi,
        &rhs,
        &BoundaryCoupling::none(),
        mask.as_ref(),
        solver.relax,
    );

    for (sweep, norm) in history.iter().enumerate() {
        log::info!("Sweep {sweep:>4}: residual {norm:.6e}");
    }

    if let (Some(first), Some(last)) = (history.first(), history.last()) {
        if *first > 0.0 && history.len() > 1 {
            let rate = (last / first).powf(1.0 / (history.len() - 1) as f64);
            log::info!("Average reduction per sweep: {rate:.4}");
        }
    }

    Ok(())
}

/// Mask with every cell of the configured overset block covered.
fn overset_mask<const N: usize>(problem: &Problem, region: IndexBox<N>) -> Result<Option<Mask<N>>> {
    let Some(block) = &problem.overset else {
        return Ok(None);
    };

    ensure!(
        block.lo.len() == N && block.hi.len() == N,
        "Overset block bounds must have one entry per axis"
    );

    let covered = IndexBox::new(
        std::array::from_fn(|axis| block.lo[axis]),
        std::array::from_fn(|axis| block.hi[axis]),
    );

    log::info!("Overset block {covered:?}");

    let mut mask: Mask<N> = Mask::new(region, 1, 1);
    mask.fill_with(mask.bounds(), |cell, _| !covered.contains(cell) as i32);

    Ok(Some(mask))
}

/// Builds the overset data of the level below and reports its consistency.
fn check_coarse_level<const N: usize>(
    config: &Config,
    region: IndexBox<N>,
    mask: &Mask<N>,
) -> Result<()> {
    ensure!(
        config.problem.cells % 2 == 0,
        "Overset problems need an even number of cells"
    );

    let coarse = region.coarsen(2);
    let mut coarse_mask: Mask<N> = Mask::new(coarse, 1, 1);
    let mut coarse_b: [Field<N>; N] = std::array::from_fn(|axis| {
        let mut field: Field<N> = Field::faces(coarse, axis, 0, 1);
        field.fill(config.problem.diffusion);
        field
    });

    // Cells beyond the patch are treated as active.
    let mut fine_mask: Mask<N> = Mask::with_bounds(coarse_mask.bounds().refine(2), 1);
    fine_mask.fill(1);
    fine_mask.fill_with(region, |cell, _| mask.get(cell, 0));

    let violations = prepare_overset_level(
        coarse,
        &fine_mask,
        &mut coarse_mask,
        coarse_b.each_mut(),
        &config.solver.overset,
    );

    log::info!(
        "Coarse level {:?}: {} partially covered cells, interface factor {:.4}",
        coarse.size(),
        violations,
        config.solver.overset.face_factor()
    );

    Ok(())
}
