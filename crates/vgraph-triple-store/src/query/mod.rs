pub mod named_graphs;
