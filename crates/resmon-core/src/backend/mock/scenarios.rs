//! Prebuilt mock filesystem states.

use super::filesystem::MockFs;

impl MockFs {
    /// A small idle host: four cores, three block devices, three
    /// processes (init, a shell, a daemon).
    pub fn quiet_host() -> Self {
        let mut fs = Self::new();

        fs.add_file(
            "/proc/stat",
            "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 0 0 0
cpu2 2500 125 750 20000 250 50 25 0 0 0
cpu3 2500 125 750 20000 250 50 25 0 0 0
intr 1000000 50 0 0 0 0 0 0 0 1 0
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
procs_blocked 0
",
        );

        fs.add_file(
            "/proc/diskstats",
            "\
   8       0 sda 12345 100 987654 5000 6789 50 456789 3000 0 4000 8000 0 0 0 0
   8       1 sda1 10000 80 800000 4000 5000 40 400000 2500 0 3500 6500 0 0 0 0
 259       0 nvme0n1 50000 200 2000000 10000 30000 150 1500000 8000 5 15000 18000 0 0 0 0
",
        );

        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapTotal:       4096000 kB
SwapFree:        4096000 kB
",
        );

        fs.add_process(
            1,
            "1 (systemd) S 0 1 1 0 -1 4194560 100 0 5 0 80 40 0 0 20 0 1 0 10 30000000 3000",
            "Name:\tsystemd\nPid:\t1\nVmRSS:\t12000 kB\n",
            "/usr/lib/systemd/systemd\0--system\0",
            "systemd\n",
        );
        fs.add_process(
            1000,
            "1000 (bash) S 1 1000 1000 34816 1000 4194304 5000 0 10 0 120 45 0 0 20 0 1 0 100 25000000 2000",
            "Name:\tbash\nPid:\t1000\nVmRSS:\t8000 kB\n",
            "/bin/bash\0",
            "bash\n",
        );
        fs.add_process(
            1001,
            "1001 (watchdogd) S 1 1001 1001 0 -1 4194304 200 0 0 0 30 15 0 0 20 0 1 0 150 1000000 500",
            "Name:\twatchdogd\nPid:\t1001\nVmRSS:\t1500 kB\n",
            "",
            "watchdogd\n",
        );

        // Non-numeric entries that a pid enumeration must skip.
        fs.add_dir("/proc/self");
        fs.add_file("/proc/uptime", "12345.67 98765.43\n");

        fs
    }
}
