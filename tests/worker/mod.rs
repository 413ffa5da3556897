mod tests_worker_run;
