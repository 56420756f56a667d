mod browser_test;
