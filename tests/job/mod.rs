mod tests_host_jobs;
mod tests_legacy_jobs;
mod tests_owner_jobs;
