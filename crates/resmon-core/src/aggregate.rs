//! Grouping of per-process results by executable name.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::ProcessSnapshot;
use crate::sampler::ProcessUsage;

/// All processes sharing one executable name, with their summed CPU
/// share and memory.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct ProcessGroup {
    pub name: String,
    pub cpu_percent: f64,
    pub memory_bytes: u64,
    /// Member snapshots in the order the processes were sampled.
    pub members: Vec<ProcessSnapshot>,
}

/// Partitions per-process results into name-keyed groups.
///
/// Every non-exited input lands in exactly one group; groups appear in
/// first-seen order and keep their members in input order. Processes
/// that exited mid-window are dropped here rather than aggregated with
/// stale counters.
pub fn group_by_executable_name(processes: &[ProcessUsage]) -> Vec<ProcessGroup> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<ProcessGroup> = Vec::new();

    for usage in processes {
        if usage.exited {
            continue;
        }
        let slot = match slots.get(usage.process.name.as_str()) {
            Some(&slot) => slot,
            None => {
                groups.push(ProcessGroup {
                    name: usage.process.name.clone(),
                    ..Default::default()
                });
                slots.insert(&usage.process.name, groups.len() - 1);
                groups.len() - 1
            }
        };
        let group = &mut groups[slot];
        group.cpu_percent += usage.cpu_percent;
        group.memory_bytes += usage.process.rss_bytes;
        group.members.push(usage.process.clone());
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(pid: u32, name: &str, rss: u64, cpu: f64) -> ProcessUsage {
        ProcessUsage {
            process: ProcessSnapshot {
                pid,
                name: name.to_string(),
                rss_bytes: rss,
                ..Default::default()
            },
            cpu_percent: cpu,
            exited: false,
        }
    }

    #[test]
    fn groups_partition_the_input_exactly() {
        let input = vec![
            usage(10, "nginx", 1000, 1.0),
            usage(11, "postgres", 4000, 2.0),
            usage(12, "nginx", 1500, 0.5),
            usage(13, "nginx", 500, 0.25),
        ];
        let groups = group_by_executable_name(&input);

        assert_eq!(groups.len(), 2);
        // First-seen order.
        assert_eq!(groups[0].name, "nginx");
        assert_eq!(groups[1].name, "postgres");

        // No pid duplicated or dropped.
        let mut pids: Vec<u32> = groups
            .iter()
            .flat_map(|g| g.members.iter().map(|m| m.pid))
            .collect();
        pids.sort_unstable();
        assert_eq!(pids, vec![10, 11, 12, 13]);
    }

    #[test]
    fn group_totals_sum_their_members() {
        let input = vec![
            usage(1, "worker", 100, 10.0),
            usage(2, "worker", 250, 5.0),
            usage(3, "worker", 650, 2.5),
        ];
        let groups = group_by_executable_name(&input);

        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.memory_bytes, 1000);
        assert_eq!(group.cpu_percent, 17.5);
        assert_eq!(
            group.memory_bytes,
            group.members.iter().map(|m| m.rss_bytes).sum::<u64>()
        );
        assert_eq!(group.members.len(), 3);
        assert_eq!(group.members[0].pid, 1);
        assert_eq!(group.members[2].pid, 3);
    }

    #[test]
    fn exited_processes_are_not_aggregated() {
        let mut gone = usage(2, "worker", 9999, 0.0);
        gone.exited = true;
        let input = vec![usage(1, "worker", 100, 1.0), gone];

        let groups = group_by_executable_name(&input);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members.len(), 1);
        assert_eq!(groups[0].memory_bytes, 100);
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(group_by_executable_name(&[]).is_empty());
    }
}
