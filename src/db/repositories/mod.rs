mod call_logs;
