//! Lays out a generated scale-free graph and prints the final vertex
//! placements as JSON, ready to be fed into a renderer.
//!
//! ```sh
//! cargo run --example layout
//! ```

use layouter::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

#[derive(Serialize)]
struct Placement {
    id: u32,
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Serialize)]
struct Link {
    id: u32,
    source: u32,
    target: u32,
}

#[derive(Serialize)]
struct Layout {
    vertices: Vec<Placement>,
    edges: Vec<Link>,
}

fn main() {
    let mut rng = StdRng::seed_from_u64(1);
    let graph: petgraph::Graph<(), ()> = petgraph_gen::barabasi_albert_graph(&mut rng, 50, 1, None);

    let mut layout = LayoutGraph::builder()
        .simulation_accuracy(0.5)
        .build_graph(&graph);
    for _ in 0..500 {
        layout.update();
    }

    let result = Layout {
        vertices: layout
            .vertices()
            .map(|vertex| Placement {
                id: vertex.id.0,
                x: vertex.position.x,
                y: vertex.position.y,
                z: vertex.position.z,
            })
            .collect(),
        edges: layout
            .edges()
            .map(|(id, source, target)| Link {
                id: id.0,
                source: source.0,
                target: target.0,
            })
            .collect(),
    };

    println!("{}", serde_json::to_string_pretty(&result).unwrap());
}
