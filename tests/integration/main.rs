mod common;
mod parallel_stress;
mod relay_udp;
mod rule_file;
