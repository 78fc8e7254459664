mod ledger_client;
