use alp_hybrid::model::MilpModel;
use alp_hybrid::resolution::{solve_with, DecompositionConfig, LoopState, NoOpReporter, RecordingReporter, Termination};
use alp_hybrid::{AlpError, Instance, Plane, SeparationMatrix};

fn run(instance: &Instance, config: &DecompositionConfig) -> (alp_hybrid::DecompositionOutcome, RecordingReporter) {
    let mut reporter = RecordingReporter::default();
    let outcome = solve_with::<MilpModel>(instance, config, &mut reporter).unwrap();
    (outcome, reporter)
}

fn matrix(rows: &[[f64; 3]]) -> SeparationMatrix {
    SeparationMatrix::new(rows.iter().map(|r| r.to_vec()).collect())
}

#[test]
fn two_planes_sharing_a_target() {
    let instance = Instance::new(
        vec![Plane::new(0, 0.0, 10.0, 20.0, 1.0, 1.0), Plane::new(1, 0.0, 10.0, 20.0, 1.0, 1.0)],
        SeparationMatrix::uniform(2, 5.0),
    );
    let (outcome, _) = run(&instance, &DecompositionConfig::default());

    assert_eq!(outcome.termination, Termination::Converged);
    assert!(outcome.iterations <= 2);
    assert!((outcome.objective.unwrap() - 5.0).abs() < 1e-6);
    let schedule = outcome.schedule.unwrap();
    assert!((schedule.time(0) - schedule.time(1)).abs() >= 5.0 - 1e-6);
}

#[test]
fn two_planes_without_separation_land_on_target() {
    let instance = Instance::new(
        vec![Plane::new(0, 0.0, 10.0, 20.0, 1.0, 1.0), Plane::new(1, 0.0, 10.0, 20.0, 1.0, 1.0)],
        SeparationMatrix::zeros(2),
    );
    let (outcome, _) = run(&instance, &DecompositionConfig::default());
    assert_eq!(outcome.termination, Termination::Converged);
    assert!(outcome.iterations <= 2);
    assert!(outcome.objective.unwrap().abs() < 1e-6);
}

#[test]
fn well_separated_planes_converge_at_once() {
    let instance = Instance::new(
        vec![
            Plane::new(0, 0.0, 5.0, 10.0, 1.0, 1.0),
            Plane::new(1, 20.0, 25.0, 30.0, 1.0, 1.0),
            Plane::new(2, 40.0, 45.0, 50.0, 1.0, 1.0),
        ],
        SeparationMatrix::uniform(3, 5.0),
    );
    let (outcome, reporter) = run(&instance, &DecompositionConfig::default());

    assert_eq!(outcome.termination, Termination::Converged);
    assert_eq!(outcome.iterations, 1);
    assert!(outcome.objective.unwrap().abs() < 1e-6);
    assert_eq!(reporter.transitions, vec![
        (LoopState::Init, LoopState::SolvingMaster),
        (LoopState::SolvingMaster, LoopState::SolvingSubproblem),
        (LoopState::SolvingSubproblem, LoopState::Converged),
    ]);
    assert!(reporter.finished);
}

#[test]
fn fractional_penalties_round_into_scaled_units() {
    let instance = Instance::new(
        vec![Plane::new(0, 0.0, 10.0, 20.0, 0.29, 1.1), Plane::new(1, 0.0, 10.0, 20.0, 1.1, 0.29)],
        SeparationMatrix::uniform(2, 5.0),
    );
    let (outcome, reporter) = run(&instance, &DecompositionConfig::default());

    assert_eq!(outcome.termination, Termination::Converged);
    assert_eq!(outcome.iterations, 1);
    assert_eq!(reporter.thetas, vec![145]);
    assert!((outcome.objective.unwrap() - 1.45).abs() < 1e-6);
    assert!((outcome.lower_bound.unwrap() - 1.45).abs() < 1e-6);
}

#[test]
fn coarse_scale_needs_cuts_but_stays_a_bound() {
    // 0.125 scales to 1 at scale 10, so the master sees 5 while the real cost is 0.625
    let instance = Instance::new(
        vec![Plane::new(0, 0.0, 10.0, 20.0, 0.125, 0.125), Plane::new(1, 0.0, 10.0, 20.0, 0.125, 0.125)],
        SeparationMatrix::uniform(2, 5.0),
    );
    let config = DecompositionConfig::default().with_cost_scale(10);
    let (outcome, reporter) = run(&instance, &config);

    assert_eq!(outcome.termination, Termination::Converged);
    assert_eq!(reporter.thetas, vec![5, 5, 7]);
    assert_eq!(outcome.statistics.optimality_cuts, 2);
    assert!((outcome.objective.unwrap() - 0.625).abs() < 1e-9);
    assert!(outcome.lower_bound.unwrap() <= outcome.objective.unwrap());
}

#[test]
fn three_planes_two_runways_split_the_conflict() {
    let instance = Instance::new(
        vec![
            Plane::new(0, 0.0, 10.0, 20.0, 1.0, 1.0),
            Plane::new(1, 0.0, 10.0, 20.0, 1.0, 1.0),
            Plane::new(2, 0.0, 10.0, 20.0, 1.0, 1.0),
        ],
        SeparationMatrix::uniform(3, 8.0),
    )
    .with_runways(2, Some(SeparationMatrix::zeros(3)));
    let (outcome, _) = run(&instance, &DecompositionConfig::default());

    assert!(outcome.is_proven_optimal());
    assert!((outcome.objective.unwrap() - 8.0).abs() < 1e-6);
    let schedule = outcome.schedule.unwrap();
    assert!(schedule.check(&instance, 1e-6).is_ok());
    let used: std::collections::BTreeSet<usize> = schedule.landings.iter().map(|l| l.runway).collect();
    assert_eq!(used.len(), 2);
}

#[test]
fn unsatisfiable_separation_is_master_infeasible() {
    let instance = Instance::new(
        vec![
            Plane::new(0, 0.0, 0.0, 1.0, 1.0, 1.0),
            Plane::new(1, 0.0, 0.0, 1.0, 1.0, 1.0),
            Plane::new(2, 0.0, 0.0, 1.0, 1.0, 1.0),
        ],
        SeparationMatrix::uniform(3, 5.0),
    )
    .with_runways(2, Some(SeparationMatrix::uniform(3, 5.0)));
    let (outcome, reporter) = run(&instance, &DecompositionConfig::default());

    assert_eq!(outcome.termination, Termination::MasterInfeasible);
    assert!(outcome.schedule.is_none());
    assert_eq!(reporter.transitions.last(), Some(&(LoopState::SolvingMaster, LoopState::MasterInfeasible)));
    assert!(matches!(outcome.into_schedule(), Err(AlpError::MasterInfeasible { .. })));
}

/// A lands before B and C on window grounds only, which the master ignores while
/// the cross runway separation makes every runway split cost 3.
fn hidden_cross_separation() -> Instance {
    Instance::new(
        vec![
            Plane::new(0, 0.0, 10.0, 10.0, 1.0, 1.0),
            Plane::new(1, 12.0, 12.0, 30.0, 1.0, 1.0),
            Plane::new(2, 12.0, 12.0, 30.0, 1.0, 1.0),
        ],
        matrix(&[[0.0, 1.0, 1.0], [1.0, 0.0, 10.0], [1.0, 10.0, 0.0]]),
    )
    .with_runways(2, Some(matrix(&[[0.0, 5.0, 5.0], [5.0, 0.0, 0.0], [5.0, 0.0, 0.0]])))
}

#[test]
fn optimality_cuts_close_the_gap() {
    let instance = hidden_cross_separation();
    let (outcome, reporter) = run(&instance, &DecompositionConfig::default());

    assert_eq!(outcome.termination, Termination::Converged);
    assert!(outcome.iterations > 1);
    assert!((outcome.objective.unwrap() - 3.0).abs() < 1e-6);
    assert!((outcome.lower_bound.unwrap() - 3.0).abs() < 1e-6);
    assert!(outcome.statistics.optimality_cuts > 0);
    assert_eq!(outcome.statistics.optimality_cuts + outcome.statistics.feasibility_cuts, reporter.cuts.len());
    assert!(reporter.transitions.contains(&(LoopState::SolvingSubproblem, LoopState::Cutting)));
    assert!(reporter.transitions.contains(&(LoopState::Cutting, LoopState::SolvingMaster)));
    assert_eq!(outcome.statistics.theta_history, reporter.thetas);
}

#[test]
fn iteration_cap_returns_unproven_schedule() {
    let instance = hidden_cross_separation();
    let config = DecompositionConfig::default().with_max_iterations(1);
    let (outcome, reporter) = run(&instance, &config);

    assert_eq!(outcome.termination, Termination::IterationLimit);
    assert!(!outcome.is_proven_optimal());
    assert_eq!(outcome.iterations, 1);
    assert_eq!(reporter.transitions.last(), Some(&(LoopState::SolvingMaster, LoopState::IterationLimit)));
    let schedule = outcome.clone().into_schedule().unwrap();
    assert!(schedule.check(&instance, 1e-6).is_ok());
    assert!((outcome.objective.unwrap() - schedule.cost(&instance)).abs() < 1e-9);
}

#[test]
fn zero_time_budget_stops_before_the_first_master() {
    let instance = hidden_cross_separation();
    let config = DecompositionConfig::default().with_timeout(0);
    let (outcome, _) = run(&instance, &config);

    assert_eq!(outcome.termination, Termination::TimeLimit);
    assert_eq!(outcome.iterations, 0);
    assert!(matches!(outcome.into_schedule(), Err(AlpError::IterationLimitExceeded { iterations: 0 })));
}

#[test]
fn no_planes_converge_at_zero_cost() {
    let instance = Instance::new(vec![], SeparationMatrix::zeros(0));
    let (outcome, _) = run(&instance, &DecompositionConfig::default());

    assert_eq!(outcome.termination, Termination::Converged);
    let objective = outcome.objective.unwrap();
    assert_eq!(objective, 0.0);
    assert!(objective.is_sign_positive());
    assert_eq!(format!("{objective}"), "0");
}

#[test]
fn malformed_instance_is_rejected_before_solving() {
    let instance = Instance::new(
        vec![Plane::new(0, 10.0, 5.0, 20.0, 1.0, 1.0)],
        SeparationMatrix::zeros(1),
    );
    let result = solve_with::<MilpModel>(&instance, &DecompositionConfig::default(), &mut NoOpReporter);
    assert!(matches!(result, Err(AlpError::MalformedInstance(_))));
}

#[test]
fn instance_from_json_defaults_to_one_runway() {
    let json = r#"{
        "planes": [
            { "id": 0, "earliest": 0.0, "target": 10.0, "latest": 20.0, "penalty_early": 1.0, "penalty_late": 1.0 },
            { "id": 1, "earliest": 0.0, "target": 10.0, "latest": 20.0, "penalty_early": 1.0, "penalty_late": 2.0 }
        ],
        "separation": [[0.0, 3.0], [3.0, 0.0]]
    }"#;
    let instance: Instance = serde_json::from_str(json).unwrap();
    assert_eq!(instance.nb_runways, 1);
    assert!(instance.cross_separation.is_none());

    let outcome = alp_hybrid::solve(&instance, &DecompositionConfig::default()).unwrap();
    assert!(outcome.is_proven_optimal());
    assert!((outcome.objective.unwrap() - 3.0).abs() < 1e-6);

    let written = serde_json::to_value(outcome.schedule.unwrap()).unwrap();
    assert_eq!(written["landings"].as_array().unwrap().len(), 2);
}
