use crate::error::DedupeError;
use crate::grouping::{DuplicationGroup, group_bindings};
use crate::ports::{DedupeEvent, ReportSink};
use crate::range::parse_range;
use crate::snapshot::read_bindings;
use crate::strategy::select;
use dedupe_types::graph::{Binding, Descriptor, Locator};
use dedupe_types::plan::{DedupeWarning, Edit, ReassignmentPlan, Strategy, UnresolvedDetail};
use dedupe_types::snapshot::GraphSnapshot;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};
use uuid::Uuid;

/// Invocation options for one planning run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanRequest {
    pub strategy: Strategy,
    /// Glob patterns over normalized package names. Empty means every package.
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Planner;

impl Planner {
    pub fn new() -> Self {
        Self
    }

    /// Read, group and plan a restored snapshot.
    pub fn plan(
        &self,
        graph: &GraphSnapshot,
        request: &PlanRequest,
        sink: &mut dyn ReportSink,
    ) -> Result<ReassignmentPlan, DedupeError> {
        let bindings = read_bindings(graph)?;
        self.plan_bindings(&bindings, request, sink)
    }

    /// Plan over already-extracted bindings.
    pub fn plan_bindings(
        &self,
        bindings: &[Binding],
        request: &PlanRequest,
        sink: &mut dyn ReportSink,
    ) -> Result<ReassignmentPlan, DedupeError> {
        let outcome = group_bindings(bindings, &request.patterns)?;
        for warning in &outcome.warnings {
            sink.emit(&DedupeEvent::Warning(warning.clone()));
        }

        let mut plan = self.plan_groups(&outcome.groups, request.strategy, sink)?;

        let mut warnings = outcome.warnings;
        warnings.append(&mut plan.warnings);
        plan.warnings = warnings;

        info!(
            strategy = %request.strategy,
            groups = outcome.groups.len(),
            edits = plan.edits.len(),
            resolved = plan.resolved_count,
            unresolved = plan.unresolved_count,
            "dedupe plan built"
        );
        Ok(plan)
    }

    /// Plan pre-grouped input. Groups are visited in key order.
    pub fn plan_groups(
        &self,
        groups: &BTreeMap<String, DuplicationGroup>,
        strategy: Strategy,
        sink: &mut dyn ReportSink,
    ) -> Result<ReassignmentPlan, DedupeError> {
        let mut plan = ReassignmentPlan::default();
        for group in groups.values() {
            plan_group(group, strategy, sink, &mut plan)?;
        }
        Ok(plan)
    }
}

fn plan_group(
    group: &DuplicationGroup,
    strategy: Strategy,
    sink: &mut dyn ReportSink,
    plan: &mut ReassignmentPlan,
) -> Result<(), DedupeError> {
    let candidates = group.distinct_versions();
    let winner = select(strategy, &group.package, &candidates)?;

    let Some(winning) = group.members.iter().find(|m| &m.version == winner) else {
        return Err(DedupeError::WinnerWithoutBinding {
            package: group.package.clone(),
            version: winner.to_string(),
        });
    };
    let to = &winning.binding.locator;
    debug!(package = %group.package, winner = %winner, locator = %to, "selected winner");

    let available: Vec<String> = group
        .members
        .iter()
        .fold(Vec::new(), |mut acc, m| {
            if !acc.contains(&m.binding.locator.version) {
                acc.push(m.binding.locator.version.clone());
            }
            acc
        });

    let mut seen: BTreeSet<&Descriptor> = BTreeSet::new();
    for member in &group.members {
        if &member.version == winner {
            continue;
        }
        let descriptor = &member.binding.descriptor;
        if !seen.insert(descriptor) {
            continue;
        }

        let satisfied = match parse_range(&descriptor.range) {
            Ok(range) => range.matches(winner),
            Err(err) => {
                let warning = DedupeWarning::UnparsableRange {
                    package: group.package.clone(),
                    range: descriptor.range.clone(),
                    message: err.to_string(),
                };
                sink.emit(&DedupeEvent::Warning(warning.clone()));
                plan.warnings.push(warning);
                false
            }
        };

        if satisfied {
            let from = &member.binding.locator;
            plan.edits.push(Edit {
                id: edit_id(&group.package, &descriptor.range, from, to).to_string(),
                descriptor: descriptor.clone(),
                from: from.clone(),
                to: to.clone(),
            });
            plan.resolved_count += 1;
            sink.emit(&DedupeEvent::Resolved {
                descriptor: descriptor.to_string(),
                from_version: from.version.clone(),
                to_version: to.version.clone(),
            });
        } else {
            plan.unresolved_details.push(UnresolvedDetail {
                package: group.package.clone(),
                range: descriptor.range.clone(),
                current_version: member.binding.locator.version.clone(),
                available_versions: available.clone(),
            });
            plan.unresolved_count += 1;
            sink.emit(&DedupeEvent::Unresolved {
                package: group.package.clone(),
                range: descriptor.range.clone(),
                versions: available.clone(),
            });
        }
    }
    Ok(())
}

/// Deterministic edit id: v5(namespace, package|range|from|to).
pub fn edit_id(package: &str, range: &str, from: &Locator, to: &Locator) -> Uuid {
    const NAMESPACE: Uuid = Uuid::from_bytes([
        0x9a, 0x1f, 0x6e, 0x02, 0x3b, 0x7c, 0x4d, 0x18, 0xa5, 0x41, 0x0c, 0xe2, 0x77, 0x3d, 0x90,
        0x5b,
    ]);

    let stable_key = format!("{}|{}|{}|{}", package, range, from.reference, to.reference);
    Uuid::new_v5(&NAMESPACE, stable_key.as_bytes())
}
