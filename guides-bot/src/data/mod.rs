pub mod guide_repository;
