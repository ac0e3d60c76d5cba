use borefield::search::{
    ExcessTemperatureOracle, GheOracle, LayoutBracketSearch, MemoizedOracle, SearchOutcome,
};
use borefield::sim::ghe::SimulationMethod;
use borefield::sim::line_source::LineSourceGFunction;
use borefield::sim::loads::{HOURS_IN_YEAR, LoadProfile};
use borefield::sim::media::{
    BheVariant, BoreholeGeometry, Fluid, Pipe, Soil, ThermalContext, ThermalProperty,
};
use borefield::sim::superposition::SuperpositionSimulator;
use borefield::{Layout, LayoutDomain, SimulationBounds};

fn context() -> ThermalContext {
    ThermalContext {
        fluid: Fluid::water(),
        pipe: Pipe::hdpe_single_u(),
        grout: ThermalProperty::new(1.0, 3_901_000.0),
        soil: Soil {
            conductivity: 2.0,
            volumetric_heat_capacity: 2_343_493.0,
            undisturbed_temperature: 18.3,
        },
        borehole: BoreholeGeometry {
            burial_depth: 2.0,
            radius: 0.075,
        },
        bhe: BheVariant::SingleUTube,
        flow_rate_per_borehole: 0.2,
    }
}

fn bounds() -> SimulationBounds {
    SimulationBounds {
        end_month: 24,
        ..SimulationBounds::new()
    }
}

fn domain() -> LayoutDomain {
    let layouts = [(1, 1), (2, 1), (2, 2), (3, 2), (3, 3)]
        .iter()
        .map(|&(nx, ny)| Layout::rectangle(nx, ny, 6.0, 6.0).unwrap())
        .collect();
    LayoutDomain::new(layouts).unwrap()
}

/// Heating-dominated building: extraction all year, stronger in winter.
fn seasonal_loads(mean: f64) -> LoadProfile {
    let values = (0..HOURS_IN_YEAR)
        .map(|h| {
            let phase = 2.0 * std::f64::consts::PI * h as f64 / HOURS_IN_YEAR as f64;
            mean * (1.0 + 0.5 * phase.cos())
        })
        .collect();
    LoadProfile::new(values).unwrap()
}

#[test]
fn excess_falls_with_borehole_length() {
    let ctx = context();
    let bounds = bounds();
    let loads = seasonal_loads(4000.0);
    let layout = Layout::rectangle(2, 2, 6.0, 6.0).unwrap();

    for method in [SimulationMethod::Hybrid, SimulationMethod::Hourly] {
        let oracle = GheOracle::new(
            LineSourceGFunction::new(),
            SuperpositionSimulator::new(),
            &ctx,
            &bounds,
            &loads,
        )
        .with_method(method);
        let excess: Vec<f64> = [60.0, 90.0, 120.0, 150.0]
            .iter()
            .map(|&h| oracle.evaluate(&layout, h).unwrap())
            .collect();
        assert!(excess.windows(2).all(|w| w[1] < w[0]), "{method:?}: {excess:?}");
        assert_eq!(oracle.history().len(), 4);
    }
}

#[test]
fn repeated_evaluations_are_identical() {
    let ctx = context();
    let bounds = bounds();
    let loads = seasonal_loads(3000.0);
    let oracle = GheOracle::new(
        LineSourceGFunction::new(),
        SuperpositionSimulator::new(),
        &ctx,
        &bounds,
        &loads,
    );
    let layout = Layout::rectangle(3, 2, 6.0, 6.0).unwrap();
    let first = oracle.evaluate(&layout, 97.5).unwrap();
    let second = oracle.evaluate(&layout, 97.5).unwrap();
    assert_eq!(first.to_bits(), second.to_bits());
}

#[test]
fn selected_design_satisfies_the_bounds() {
    let ctx = context();
    let bounds = bounds();
    let loads = seasonal_loads(5000.0);
    let ghe = GheOracle::new(
        LineSourceGFunction::new(),
        SuperpositionSimulator::new(),
        &ctx,
        &bounds,
        &loads,
    );
    let oracle = MemoizedOracle::new(ghe);
    let domain = domain();

    let result = LayoutBracketSearch::default()
        .select(&oracle, &domain, &bounds)
        .unwrap();
    let SearchOutcome::Selected(selection) = &result.outcome else {
        panic!("a 5 kW load fits the domain, got {:?}", result.outcome);
    };
    let fresh = GheOracle::new(
        LineSourceGFunction::new(),
        SuperpositionSimulator::new(),
        &ctx,
        &bounds,
        &loads,
    );
    let i = selection.layout_index;
    assert!(i > 0, "a 5 kW load needs more than one borehole");
    assert!(fresh.evaluate(&domain[i], selection.height).unwrap() <= 0.0);
    assert!(fresh.evaluate(&domain[i - 1], bounds.max_height).unwrap() > 0.0);
    assert!(selection.height >= bounds.min_height && selection.height <= bounds.max_height);
    assert!(
        (selection.total_drilling_length - selection.height * domain[i].len() as f64).abs() < 1e-9
    );

    let again = LayoutBracketSearch::default()
        .select(&oracle, &domain, &bounds)
        .unwrap();
    assert_eq!(result, again);
}

#[test]
fn light_load_fits_the_smallest_layout_at_min_height() {
    let ctx = context();
    let bounds = bounds();
    let loads = LoadProfile::constant(100.0).unwrap();
    let oracle = GheOracle::new(
        LineSourceGFunction::new(),
        SuperpositionSimulator::new(),
        &ctx,
        &bounds,
        &loads,
    );
    let result = LayoutBracketSearch::default()
        .select(&oracle, &domain(), &bounds)
        .unwrap();
    let selection = result.selection().unwrap();
    assert_eq!(selection.layout_index, 0);
    assert_eq!(selection.height, bounds.min_height);
}

#[test]
fn heavy_load_is_infeasible() {
    let ctx = context();
    let bounds = bounds();
    let loads = LoadProfile::constant(200_000.0).unwrap();
    let oracle = GheOracle::new(
        LineSourceGFunction::new(),
        SuperpositionSimulator::new(),
        &ctx,
        &bounds,
        &loads,
    );
    let result = LayoutBracketSearch::default()
        .select(&oracle, &domain(), &bounds)
        .unwrap();
    assert!(!result.is_feasible());
    assert_eq!(result.evaluated_indices(), vec![0, 4]);
}
