mod fs_runtime;
